// Dashboard composition: reference checks, delete policies, active workspace, seeding

mod common;

use common::*;
use corsihub_sim::config::DeletePolicy;
use corsihub_sim::error::Error;
use corsihub_sim::models::*;
use std::time::Duration;

#[tokio::test]
async fn create_server_requires_existing_workspace() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let err = dashboard
        .create_server(NewServer {
            name: "web-1".into(),
            region: "us-east-1".into(),
            workspace_id: WorkspaceId::from("nope"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::WorkspaceNotFound(_)));
    assert!(dashboard.servers.is_empty().await);
}

#[tokio::test]
async fn create_server_rejects_short_name() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let ws = dashboard.create_workspace("Acme", false).await.unwrap();
    let err = dashboard
        .create_server(NewServer {
            name: " w ".into(),
            region: "us-east-1".into(),
            workspace_id: ws.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
}

#[tokio::test]
async fn create_workspace_rejects_blank_name() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let err = dashboard.create_workspace("   ", false).await.unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
    assert!(dashboard.workspaces.is_empty().await);
}

#[tokio::test]
async fn create_container_validates_server_and_port() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let (_ws, server) = acme_with_server(&dashboard).await;

    let err = dashboard
        .create_container(new_container("app", "http", &server))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));

    let mut orphan = new_container("app", "8080:80", &server);
    orphan.server_id = ServerId::from("missing");
    let err = dashboard.create_container(orphan).await.unwrap_err();
    assert!(matches!(err, Error::ServerNotFound(_)));

    let other = dashboard.create_workspace("Other", false).await.unwrap();
    let mut cross = new_container("app", "8080:80", &server);
    cross.workspace_id = other.id;
    let err = dashboard.create_container(cross).await.unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));

    assert!(dashboard.containers.is_empty().await);
}

#[tokio::test]
async fn create_agent_requires_server_in_workspace() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let (_ws, server) = acme_with_server(&dashboard).await;
    let mut agent = new_agent("agent-1", &server);
    agent.server_id = ServerId::from("missing");
    let err = dashboard.create_agent(agent).await.unwrap_err();
    assert!(matches!(err, Error::ServerNotFound(_)));
}

#[tokio::test]
async fn create_domain_requires_container_and_unique_name() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let (ws, server) = acme_with_server(&dashboard).await;

    let err = dashboard
        .create_domain(new_domain("app.example.com", "app", &ws.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ContainerNotFound(_)));

    dashboard
        .create_container(new_container("app", "8080:80", &server))
        .await
        .unwrap();
    dashboard
        .create_domain(new_domain("app.example.com", "app", &ws.id))
        .await
        .unwrap();
    let err = dashboard
        .create_domain(new_domain("APP.example.com", "app", &ws.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));

    let err = dashboard
        .create_domain(new_domain("localhost", "app", &ws.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
    assert_eq!(dashboard.domains.len().await, 1);
}

#[tokio::test]
async fn update_domain_checks_new_container() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let (ws, server) = acme_with_server(&dashboard).await;
    dashboard
        .create_container(new_container("app", "8080:80", &server))
        .await
        .unwrap();
    dashboard
        .create_container(new_container("api", "3000", &server))
        .await
        .unwrap();
    let domain = dashboard
        .create_domain(new_domain("app.example.com", "app", &ws.id))
        .await
        .unwrap();

    let err = dashboard
        .update_domain(
            &domain.id,
            DomainPatch {
                container_name: Some("missing".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ContainerNotFound(_)));

    let updated = dashboard
        .update_domain(
            &domain.id,
            DomainPatch {
                container_name: Some("api".into()),
                dns_type: Some(DnsType::Cname),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.container_name, "api");
    assert_eq!(updated.dns_type, DnsType::Cname);
    assert_eq!(updated.dns_value, domain.dns_value);
}

#[tokio::test]
async fn cascade_server_delete_removes_dependents_only() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let (ws, web) = acme_with_server(&dashboard).await;
    let db = dashboard
        .create_server(NewServer {
            name: "db-1".into(),
            region: "eu-west-1".into(),
            workspace_id: ws.id.clone(),
        })
        .await
        .unwrap();
    dashboard.create_container(new_container("app", "80", &web)).await.unwrap();
    let pg = dashboard
        .create_container(new_container("postgres", "5432", &db))
        .await
        .unwrap();
    dashboard
        .create_domain(new_domain("app.example.com", "app", &ws.id))
        .await
        .unwrap();
    dashboard.create_agent(new_agent("agent-web", &web)).await.unwrap();
    let db_agent = dashboard.create_agent(new_agent("agent-db", &db)).await.unwrap();

    dashboard.delete_server(&web.id).await.unwrap();

    let servers = dashboard.servers.all().await;
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].id, db.id);
    let containers = dashboard.containers.all().await;
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].id, pg.id);
    assert!(dashboard.domains.is_empty().await);
    let agents = dashboard.agents.all().await;
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].id, db_agent.id);
}

#[tokio::test]
async fn restrict_policy_refuses_deletes_with_dependents() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Restrict);
    let (ws, server) = acme_with_server(&dashboard).await;
    let container = dashboard
        .create_container(new_container("app", "8080:80", &server))
        .await
        .unwrap();
    let domain = dashboard
        .create_domain(new_domain("app.example.com", "app", &ws.id))
        .await
        .unwrap();

    let err = dashboard.delete_container(&container.id).await.unwrap_err();
    assert!(matches!(err, Error::HasDependents { entity: "container", dependents: 1, .. }));
    let err = dashboard.delete_server(&server.id).await.unwrap_err();
    assert!(matches!(err, Error::HasDependents { entity: "server", .. }));
    let err = dashboard.delete_workspace(&ws.id).await.unwrap_err();
    assert!(matches!(err, Error::HasDependents { entity: "workspace", .. }));
    assert_eq!(dashboard.containers.len().await, 1);

    // bottom-up deletion is allowed
    dashboard.domains.delete(&domain.id).await.unwrap();
    dashboard.delete_container(&container.id).await.unwrap();
    dashboard.delete_server(&server.id).await.unwrap();
    dashboard.delete_workspace(&ws.id).await.unwrap();
    assert_eq!(dashboard.counts().await.workspaces, 0);
}

#[tokio::test]
async fn cascade_workspace_delete_leaves_other_workspaces() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let (acme, server) = acme_with_server(&dashboard).await;
    dashboard.create_container(new_container("app", "80", &server)).await.unwrap();
    dashboard.create_agent(new_agent("agent-1", &server)).await.unwrap();

    let other = dashboard.create_workspace("Other", false).await.unwrap();
    let other_server = dashboard
        .create_server(NewServer {
            name: "web-9".into(),
            region: "ap-south-1".into(),
            workspace_id: other.id.clone(),
        })
        .await
        .unwrap();

    dashboard.delete_workspace(&acme.id).await.unwrap();
    let counts = dashboard.counts().await;
    assert_eq!(counts.workspaces, 1);
    assert_eq!(counts.servers, 1);
    assert_eq!(counts.containers, 0);
    assert_eq!(counts.agents, 0);
    assert_eq!(dashboard.servers.all().await[0].id, other_server.id);
}

#[tokio::test]
async fn active_workspace_follows_creates_and_deletes() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    assert!(dashboard.active_workspace().await.is_none());

    let a = dashboard.create_workspace("Alpha", false).await.unwrap();
    let b = dashboard.create_workspace("Beta", false).await.unwrap();
    assert_eq!(dashboard.active_workspace().await.unwrap().id, b.id);

    dashboard.set_active_workspace(&a.id).await.unwrap();
    assert_eq!(dashboard.active_workspace().await.unwrap().id, a.id);

    let err = dashboard
        .set_active_workspace(&WorkspaceId::from("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::WorkspaceNotFound(_)));

    dashboard.delete_workspace(&a.id).await.unwrap();
    assert_eq!(dashboard.active_workspace().await.unwrap().id, b.id);

    dashboard.delete_workspace(&b.id).await.unwrap();
    assert!(dashboard.active_workspace().await.is_none());
    assert!(dashboard.active_workspace.get().await.is_none());
}

#[tokio::test]
async fn tokens_generate_and_revoke() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let token = dashboard.generate_token("ci").await.unwrap();
    assert!(token.token.starts_with(TOKEN_PREFIX));

    let revoked = dashboard.revoke_token(&token.id).await.unwrap();
    assert_eq!(revoked.id, token.id);
    let err = dashboard.revoke_token(&token.id).await.unwrap_err();
    assert!(matches!(err, Error::TokenNotFound(_)));
    assert!(dashboard.generate_token("").await.is_err());
}

#[tokio::test(start_paused = true)]
async fn seeded_workspace_gets_starter_infrastructure() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let ws = dashboard.create_workspace("Acme Corp", true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(SEED_STEP_MS * 4 + 100)).await;

    let servers = dashboard.servers.get_all_by_workspace(&ws.id).await;
    let names: Vec<&str> = servers.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["web-server-01", "db-server-01"]);
    assert!(servers.iter().all(|s| s.is_online() && s.agent_connected));

    let containers = dashboard.containers.get_all_by_workspace(&ws.id).await;
    let names: Vec<&str> = containers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["nginx", "api", "postgres"]);
    assert_eq!(containers[2].server_name, "db-server-01");

    let domains = dashboard.domains.get_all_by_workspace(&ws.id).await;
    let names: Vec<&str> = domains.iter().map(|d| d.domain.as_str()).collect();
    assert_eq!(names, vec!["acme-corp.corsihub.app", "api.acme-corp.corsihub.app"]);
    assert_eq!(domains[0].dns_value, servers[0].ip);
    assert_eq!(domains[1].dns_type, DnsType::Cname);

    let agents = dashboard.agents.get_all_by_workspace(&ws.id).await;
    let names: Vec<&str> = agents.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["agent-web-01", "agent-db-01"]);

    // seeded domains get their certificates like any other
    tokio::time::sleep(Duration::from_millis(SSL_DELAY_MS)).await;
    let domains = dashboard.domains.get_all_by_workspace(&ws.id).await;
    assert!(domains.iter().all(|d| d.ssl_status == SslStatus::Active));
}

#[tokio::test(start_paused = true)]
async fn deleting_workspace_mid_seed_stops_seeding() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let ws = dashboard.create_workspace("Acme", true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(SEED_STEP_MS + 100)).await;
    assert_eq!(dashboard.servers.count_by_workspace(&ws.id).await, 2);

    dashboard.delete_workspace(&ws.id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(SEED_STEP_MS * 10)).await;

    let counts = dashboard.counts().await;
    assert_eq!(counts.workspaces, 0);
    assert_eq!(counts.servers, 0);
    assert_eq!(counts.containers, 0);
    assert_eq!(counts.domains, 0);
    assert_eq!(counts.agents, 0);
    assert_eq!(counts.pending_transitions, 0);
}

#[tokio::test]
async fn rebinding_domain_trims_container_name_so_cascade_still_applies() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let (ws, server) = acme_with_server(&dashboard).await;
    dashboard.create_container(new_container("app", "80", &server)).await.unwrap();
    let api = dashboard.create_container(new_container("api", "3000", &server)).await.unwrap();
    let domain = dashboard
        .create_domain(new_domain("a.example.com", "app", &ws.id))
        .await
        .unwrap();

    let updated = dashboard
        .update_domain(
            &domain.id,
            DomainPatch {
                container_name: Some(" api ".into()),
                dns_value: Some(" 203.0.113.20 ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.container_name, "api");
    assert_eq!(updated.dns_value, "203.0.113.20");

    dashboard.delete_container(&api.id).await.unwrap();
    assert!(dashboard.domains.is_empty().await);
}

#[tokio::test]
async fn renaming_container_carries_bound_domains() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let (ws, server) = acme_with_server(&dashboard).await;
    let api = dashboard.create_container(new_container("api", "3000", &server)).await.unwrap();
    let domain = dashboard
        .create_domain(new_domain("api.example.com", "api", &ws.id))
        .await
        .unwrap();

    let renamed = dashboard
        .update_container(
            &api.id,
            ContainerPatch {
                name: Some(" web ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "web");
    assert_eq!(
        dashboard.domains.get(&domain.id).await.unwrap().container_name,
        "web"
    );

    dashboard.delete_container(&api.id).await.unwrap();
    assert!(dashboard.containers.is_empty().await);
    assert!(dashboard.domains.is_empty().await);
}

#[tokio::test]
async fn restrict_refuses_renaming_container_with_bound_domains() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Restrict);
    let (ws, server) = acme_with_server(&dashboard).await;
    let api = dashboard.create_container(new_container("api", "3000", &server)).await.unwrap();
    dashboard
        .create_domain(new_domain("api.example.com", "api", &ws.id))
        .await
        .unwrap();

    let err = dashboard
        .update_container(
            &api.id,
            ContainerPatch {
                name: Some("web".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HasDependents { entity: "container", dependents: 1, .. }));
    assert_eq!(dashboard.containers.get(&api.id).await.unwrap().name, "api");

    // other fields can still change
    let updated = dashboard
        .update_container(
            &api.id,
            ContainerPatch {
                name: Some("api".into()),
                image: Some("node:22-alpine".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.image, "node:22-alpine");
}

#[tokio::test]
async fn container_names_are_unique_per_workspace() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let (ws, web1) = acme_with_server(&dashboard).await;
    let web2 = dashboard
        .create_server(NewServer {
            name: "web-2".into(),
            region: "us-east-1".into(),
            workspace_id: ws.id.clone(),
        })
        .await
        .unwrap();
    dashboard.create_container(new_container("nginx", "80", &web1)).await.unwrap();

    let err = dashboard
        .create_container(new_container(" nginx ", "80", &web2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));

    let api = dashboard.create_container(new_container("api", "3000", &web2)).await.unwrap();
    let err = dashboard
        .update_container(
            &api.id,
            ContainerPatch {
                name: Some("nginx".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
    assert_eq!(dashboard.containers.get(&api.id).await.unwrap().name, "api");
}

#[tokio::test]
async fn same_container_name_in_another_workspace_keeps_its_domains() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    let (_acme, web1) = acme_with_server(&dashboard).await;
    dashboard.create_container(new_container("nginx", "80", &web1)).await.unwrap();

    let other = dashboard.create_workspace("Other", false).await.unwrap();
    let web2 = dashboard
        .create_server(NewServer {
            name: "web-2".into(),
            region: "eu-west-1".into(),
            workspace_id: other.id.clone(),
        })
        .await
        .unwrap();
    dashboard.create_container(new_container("nginx", "80", &web2)).await.unwrap();
    let domain = dashboard
        .create_domain(new_domain("other.example.com", "nginx", &other.id))
        .await
        .unwrap();

    dashboard.delete_server(&web1.id).await.unwrap();
    assert_eq!(dashboard.containers.len().await, 1);
    assert!(dashboard.domains.get(&domain.id).await.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_never_outlive_their_workspace() {
    let (dashboard, _rx) = test_dashboard(DeletePolicy::Cascade);
    for round in 0..25 {
        let ws = dashboard.create_workspace(&format!("ws-{}", round), false).await.unwrap();
        let mut creators = Vec::new();
        for i in 0..8 {
            let dashboard = dashboard.clone();
            let workspace_id = ws.id.clone();
            creators.push(tokio::spawn(async move {
                let _ = dashboard
                    .create_server(NewServer {
                        name: format!("srv-{}", i),
                        region: "us-east-1".into(),
                        workspace_id,
                    })
                    .await;
            }));
        }
        tokio::task::yield_now().await;
        dashboard.delete_workspace(&ws.id).await.unwrap();
        for c in creators {
            c.await.unwrap();
        }
        assert_eq!(dashboard.servers.count_by_workspace(&ws.id).await, 0);
    }
}

mod config;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use lab_sync_client::backend::TableClient;
use lab_sync_client::live::LiveView;
use lab_sync_client::memory::MemoryBackend;
use lab_sync_client::subscription::Subscriptions;
use lab_sync_client::workflow::{delete_record, save_record, AssetUpload};
use lab_sync_core::record::domain::{
    parse_skills, Equipment, EquipmentDraft, EquipmentStatus, TeamMember, TeamMemberDraft,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = config::DemoConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!("Starting lab-sync demo");

    let backend = Arc::new(MemoryBackend::with_bus_capacity(config.bus_capacity));
    let equipment: TableClient<Equipment> = TableClient::new(backend.clone());
    let team: TableClient<TeamMember> = TableClient::new(backend.clone());
    let subscriptions = Subscriptions::new(backend.clone());

    seed(&config, &equipment, &team, backend.as_ref()).await?;

    // The public gallery and the admin dashboard mount on the same table and
    // share one upstream change channel; the roster watches its own.
    let mut gallery = LiveView::open(equipment.clone(), &subscriptions).await;
    let mut dashboard = LiveView::open(equipment.clone(), &subscriptions).await;
    let mut roster = LiveView::open(team.clone(), &subscriptions).await;

    watch_view(&gallery, "equipment gallery");
    watch_view(&dashboard, "equipment dashboard");
    watch_members(&roster);

    let writer = tokio::spawn(simulate_admin(
        equipment.clone(),
        backend.clone(),
        Duration::from_millis(config.write_interval_ms),
    ));

    shutdown_signal().await;

    writer.abort();
    gallery.close().await;
    dashboard.close().await;
    roster.close().await;
    tracing::info!("Demo shut down gracefully");
    Ok(())
}

/// Populate the backend with a starting gallery and roster.
async fn seed(
    config: &config::DemoConfig,
    equipment: &TableClient<Equipment>,
    team: &TableClient<TeamMember>,
    backend: &MemoryBackend,
) -> anyhow::Result<()> {
    for n in 1..=config.seed_count {
        let draft = EquipmentDraft {
            name: format!("Bench Unit {n}"),
            status: EquipmentStatus::Available,
            content: "Seeded demo equipment".to_string(),
            image_url: None,
        };
        let asset = AssetUpload::new(&format!("unit-{n}.png"), vec![0; 64]);
        save_record(equipment, backend, draft, Some(asset), None).await?;
    }

    let member = TeamMemberDraft {
        name: "Ada Park".to_string(),
        role: "Lab Lead".to_string(),
        department: "Instrumentation".to_string(),
        bio: "Keeps the bench honest.".to_string(),
        email: "ada@lab.example".to_string(),
        linkedin: String::new(),
        github: String::new(),
        skills: parse_skills("rust, embedded, signal processing"),
        image_url: None,
    };
    save_record(team, backend, member, None, None).await?;

    tracing::info!(equipment = config.seed_count, members = 1, "seeded backend");
    Ok(())
}

/// Log every snapshot a view publishes.
fn watch_view(view: &LiveView<Equipment>, label: &'static str) {
    let mut snapshots = view.watch();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let records = snapshots.borrow().clone();
            tracing::info!(
                view = label,
                count = records.len(),
                newest = records.first().map(|r| r.name.as_str()).unwrap_or("-"),
                "view updated"
            );
        }
    });
}

fn watch_members(view: &LiveView<TeamMember>) {
    let mut snapshots = view.watch();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let records = snapshots.borrow().clone();
            tracing::info!(count = records.len(), "team roster updated");
        }
    });
}

/// Rotate through insert / status-toggle / delete so every reconciliation
/// path shows up in the view logs.
async fn simulate_admin(
    client: TableClient<Equipment>,
    backend: Arc<MemoryBackend>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    let mut step: u64 = 0;
    loop {
        ticker.tick().await;
        let result = match step % 3 {
            0 => {
                let draft = EquipmentDraft {
                    name: format!("Field Kit {}", step / 3 + 1),
                    status: EquipmentStatus::Available,
                    content: "Added while the views were live".to_string(),
                    image_url: None,
                };
                save_record(&client, backend.as_ref(), draft, None, None)
                    .await
                    .map(|_| ())
            }
            1 => match client.fetch_all().await.map(|rows| rows.into_iter().next()) {
                Ok(Some(newest)) => {
                    let draft = EquipmentDraft {
                        name: newest.name.clone(),
                        status: match newest.status {
                            EquipmentStatus::Available => EquipmentStatus::NotAvailable,
                            EquipmentStatus::NotAvailable => EquipmentStatus::Available,
                        },
                        content: newest.content.clone(),
                        image_url: newest.image_url.clone(),
                    };
                    save_record(&client, backend.as_ref(), draft, None, Some(newest.id))
                        .await
                        .map(|_| ())
                }
                Ok(None) => Ok(()),
                Err(err) => Err(err),
            },
            _ => match client.fetch_all().await.map(|rows| rows.into_iter().last()) {
                Ok(Some(oldest)) => delete_record(&client, backend.as_ref(), &oldest).await,
                Ok(None) => Ok(()),
                Err(err) => Err(err),
            },
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "simulated admin write failed");
        }
        step += 1;
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rest_gateway::{load_settings, normalize_server_url, RestEntityGateway};
use screen_core::{
    EntityScreenController, MessageCatalog, ScreenConfig, ScreenDelegate, ScreenEvent,
    StaticRouteParams,
};
use shared::domain::EntityRecord;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Department maintenance screen wired against a live backend. Only the
/// steps that differ from the base behavior are overridden.
struct DepartmentScreen;

#[async_trait::async_trait]
impl ScreenDelegate for DepartmentScreen {
    fn required_init_parameters(&self) -> Option<ScreenConfig> {
        Some(ScreenConfig::new(
            "inventory",
            "department",
            "Department",
            "departments.page",
        ))
    }

    fn validate_before_save_or_update(&self, entity: &EntityRecord) -> bool {
        if entity.name.trim().is_empty() {
            warn!("department name is required");
            return false;
        }
        true
    }

    fn additional_message_labels(
        &self,
        catalog: &dyn MessageCatalog,
    ) -> Option<std::collections::HashMap<String, String>> {
        Some(std::collections::HashMap::from([(
            "departmentName".to_string(),
            catalog.resolve("general.name"),
        )]))
    }
}

#[derive(Parser, Debug)]
struct Cli {
    /// Overrides the server url from gateway.toml / the environment.
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Show {
        uuid: String,
    },
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        uuid: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Retire {
        uuid: String,
        #[arg(long)]
        reason: Option<String>,
    },
    Unretire {
        uuid: String,
    },
    Purge {
        uuid: String,
    },
}

impl Command {
    fn route(&self) -> StaticRouteParams {
        match self {
            Command::Create { .. } => StaticRouteParams::none(),
            Command::Show { uuid }
            | Command::Update { uuid, .. }
            | Command::Retire { uuid, .. }
            | Command::Unretire { uuid }
            | Command::Purge { uuid } => StaticRouteParams::with_uuid(uuid.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(server_url) = &cli.server_url {
        settings.server_url = normalize_server_url(server_url);
    }
    let gateway = RestEntityGateway::from_settings(&settings)?;

    let controller = EntityScreenController::new(
        Arc::new(DepartmentScreen),
        Arc::new(gateway),
        Arc::new(cli.command.route()),
    );
    let mut events = controller.subscribe_events();
    controller.load_page().await;

    match &cli.command {
        Command::Show { .. } => {}
        Command::Create { name, description } | Command::Update { name, description, .. } => {
            controller
                .edit_entity(|entity| {
                    entity.name = name.clone();
                    entity.description = description.clone();
                })
                .await;
            controller.save_or_update().await;
        }
        Command::Retire { reason, .. } => {
            controller
                .edit_entity(|entity| {
                    entity.retire_reason = reason.clone();
                })
                .await;
            controller.retire_or_unretire_call(true).await;
        }
        Command::Unretire { .. } => {
            controller.retire_or_unretire_call(false).await;
        }
        Command::Purge { .. } => {
            controller.purge().await;
        }
    }

    while let Ok(event) = events.try_recv() {
        match event {
            ScreenEvent::EntityBound => println!("entity bound"),
            ScreenEvent::Navigated { target } => println!("navigated to {target}"),
            ScreenEvent::ErrorMessage(message) => println!("error: {message}"),
            ScreenEvent::ConfirmationRequested { element_id } => {
                println!("confirmation requested for {element_id}")
            }
        }
    }

    let view = controller.view().await;
    println!(
        "department uuid={} name={} retired={}",
        view.entity.uuid_str(),
        view.entity.name,
        view.entity.retired
    );

    Ok(())
}

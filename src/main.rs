use mongodb::{Client, options::ClientOptions, bson::doc};
use anyhow::{anyhow, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tracing::{error, info};
mod cli;
mod config;
mod db;
mod error;
mod flow;
mod models;
mod photos;
mod plant_id;
mod server;
mod trefle;
mod view;
mod watering;
use cli::{AddArgs, Cli, Commands};
use config::Config;
use db::{parse_plant_id, MongoStore};
use flow::status_for;
use models::{Owner, Plant};
use photos::FileStore;
use plant_id::PlantIdClient;
use server::AppState;
use trefle::TrefleClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    // Connect to MongoDB:
    let mut client_options = match ClientOptions::parse(&config.mongo_uri).await {
        Ok(options) => options,
        Err(e) => {
            error!("Error al parsear URI de MongoDB: {}", e);
            return Err(e.into());
        }
    };
    client_options.server_selection_timeout = Some(Duration::from_secs(10));

    let client = Client::with_options(client_options)?;
    let db = client.database(&config.database);
    if let Err(e) = db.run_command(doc! { "ping": 1 }).await {
        error!("Error al conectar con MongoDB (ping fallido): {}", e);
        return Err(e.into());
    }
    let store = Arc::new(MongoStore::new(db.collection::<Plant>(&config.collection)));

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let state = AppState {
        identifier: Arc::new(PlantIdClient::new(
            http.clone(),
            config.plant_id_url.clone(),
            config.plant_id_key.clone(),
        )),
        catalog: Arc::new(TrefleClient::new(
            http,
            config.trefle_url.clone(),
            config.trefle_token.clone(),
        )),
        photos: Arc::new(FileStore::open(&config.photo_dir, &config.photo_base_url)?),
        store,
    };

    match cli.command {
        Commands::Serve { listen } => server::serve(state, &listen).await?,
        Commands::View { id, ids } => {
            let owner = require_owner(cli.owner.as_deref())?;
            let now = Utc::now();
            match id {
                Some(id) => {
                    let oid = parse_plant_id(&id)?;
                    match state.store.get(&owner, &oid).await? {
                        Some(plant) => print!("{}", view::detail(&plant, now)),
                        None => println!("No se encontró planta con ID {}", id),
                    }
                }
                None => {
                    let plants = state.store.list(&owner).await?;
                    if ids {
                        print!("{}", view::plant_ids(&plants));
                    } else {
                        print!("{}", view::dashboard(&plants, now));
                    }
                }
            }
        }
        Commands::Add(args) => add(&state, &require_owner(cli.owner.as_deref())?, args).await?,
        Commands::Water { id } => {
            let owner = require_owner(cli.owner.as_deref())?;
            let oid = parse_plant_id(&id)?;
            if state.store.mark_watered(&owner, &oid, Utc::now()).await? {
                info!(id = %oid, "plant watered");
                println!("Planta ID {} marcada como regada", id);
            } else {
                println!("No se encontró planta con ID {}", id);
            }
        }
    }

    Ok(())
}

fn require_owner(owner: Option<&str>) -> Result<Owner> {
    owner
        .and_then(Owner::new)
        .ok_or_else(|| anyhow!("Falta el dueño: usa --owner o ARBOLITOS_OWNER"))
}

async fn add(state: &AppState, owner: &Owner, args: AddArgs) -> Result<()> {
    let flow = state.flow();
    let result = match (args.photo, args.name) {
        (Some(path), None) => {
            let bytes = tokio::fs::read(&path).await?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("photo.jpg")
                .to_string();
            flow.add_from_photo(owner, &filename, &bytes).await
        }
        (None, Some(name)) => flow.add_by_name(owner, &name).await,
        _ => return Err(anyhow!("Usa --photo o --name, no ambos")),
    };

    println!("{}", status_for(&result));
    if let Err(e) = result {
        error!(error = %e, "add plant failed");
        return Err(e.into());
    }
    Ok(())
}

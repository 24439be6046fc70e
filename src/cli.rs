use std::path::PathBuf;

use clap::{Parser, Subcommand, Args};

#[derive(Parser)]
#[command(name = "arbolitos-jardin")]
#[command(about = "Una CLI para cuidar mis plantas: identificarlas, registrarlas y saber cuándo regarlas")]
pub struct Cli {
    /// Dueño de las plantas (todas las operaciones se limitan a sus plantas)
    #[arg(long, env = "ARBOLITOS_OWNER", global = true)]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Levantar el servidor HTTP
    Serve {
        /// Dirección de escucha
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,
    },
    /// Ver plantas con su estado de riego (todas o una por ID)
    View {
        /// ID de la planta (ObjectId)
        #[arg(long = "id")]
        id: Option<String>,

        #[arg(long = "ids")]
        ids: bool,
    },
    /// Agregar nueva planta desde una foto o por nombre
    Add(AddArgs),
    /// Marcar una planta como regada
    Water {
        /// ID de la planta a marcar (ObjectId)
        #[arg(long)]
        id: String,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct AddArgs {
    /// Foto de la planta, se identifica con Plant.id
    #[arg(short = 'p', long = "photo")]
    pub photo: Option<PathBuf>,
    /// Nombre de la planta, se busca directamente en Trefle
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_needs_exactly_one_source() {
        assert!(Cli::try_parse_from(["arbolitos-jardin", "add"]).is_err());
        assert!(Cli::try_parse_from(["arbolitos-jardin", "add", "-n", "menta", "-p", "x.jpg"]).is_err());

        let cli = Cli::try_parse_from(["arbolitos-jardin", "--owner", "ana", "add", "-n", "basilic"]).unwrap();
        assert_eq!(cli.owner.as_deref(), Some("ana"));
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.name.as_deref(), Some("basilic"));
                assert!(args.photo.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn owner_flag_is_global() {
        let cli = Cli::try_parse_from(["arbolitos-jardin", "water", "--id", "abc", "--owner", "luis"]).unwrap();
        assert_eq!(cli.owner.as_deref(), Some("luis"));
    }
}

use clap::Parser;
use docpath::{
    app::state::AppState,
    config::{Command, StartArgs},
    error::DocpathError,
    map_err,
};
use serde::Serialize;
use tracing::info;

#[tokio::main]
async fn main() {
    let args = StartArgs::parse();
    let app = AppState::new(&args).await;
    let mover = &app.services.mover;

    let result = match args.command {
        Command::MoveDocument { id } => mover.move_document(id).await.and_then(|result| {
            info!("Emitting {}", result.notification());
            output(&result)
        }),
        Command::MoveDocuments { type_id } => {
            mover.move_documents(type_id).await.and_then(|result| {
                info!("Emitting {}", result.notification());
                output(&result)
            })
        }
    };

    if let Err(e) = result {
        e.print();
        std::process::exit(1);
    }
}

fn output<T: Serialize>(value: &T) -> Result<(), DocpathError> {
    let json = map_err!(serde_json::to_string_pretty(value));
    println!("{json}");
    Ok(())
}

/// Console transport
///
/// Line-oriented stand-in for the bot transport collaborator: reads
/// commands from stdin under one configured user identity and prints
/// replies. The dispatcher itself is transport-agnostic, so a messaging
/// transport slots in by calling `Dispatcher::handle_line` with its own
/// user ids.

use crate::dispatch::Dispatcher;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Runs the console loop until EOF or `quit`
pub async fn run_console(dispatcher: Dispatcher, user_id: String) -> anyhow::Result<()> {
    println!("inkshelf console ({}). Send help for commands, quit to exit.", user_id);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        let reply = dispatcher.handle_line(&user_id, line).await;
        println!("{}\n", reply);
    }

    tracing::info!("console transport closed");
    Ok(())
}

use tabled::Table;

use crate::{
    cli::{generate::print_result, open_session},
    error, info, utils, warning,
};

pub async fn history(show: Option<usize>) {
    let mut session = match open_session().await {
        Ok(session) => session,
        Err(e) => error!("Cannot open session. Err: {}", e),
    };

    if session.history().is_empty() {
        warning!("No playlists generated yet. Run vibesync generate.");
        return;
    }

    match show {
        Some(index) => match session.load_from_history(index) {
            Some(result) => {
                info!("Generated {}", utils::format_timestamp(result.timestamp));
                print_result(result);
            }
            None => error!(
                "No history entry {}. There are {} entries.",
                index,
                session.history().len()
            ),
        },
        None => {
            let table = Table::new(utils::build_history_rows(session.history()));
            println!("{}", table);
        }
    }
}

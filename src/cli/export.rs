use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    cli::{auth::login_in_browser, open_session},
    error, info,
    session::SyncOutcome,
    success, warning,
};

pub async fn export(index: usize, open: bool) {
    let mut session = match open_session().await {
        Ok(session) => session,
        Err(e) => error!("Cannot open session. Err: {}", e),
    };

    let name = match session.load_from_history(index) {
        Some(result) => result.playlist_name.clone(),
        None => error!("No history entry {}. Run vibesync generate first.", index),
    };
    let total = session.current().map(|r| r.tracks.len()).unwrap_or(0) as u64;

    info!("Exporting \"{}\" to Spotify", name);

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{bar:40.green/blue} {pos:>3}% {msg}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_message(format!("searching {} tracks", total));

    let outcome = session.sync_to_spotify(|percent| pb.set_position(percent as u64)).await;
    pb.finish_and_clear();

    match outcome {
        Ok(SyncOutcome::Exported(report)) => {
            if report.matched < report.total {
                warning!(
                    "{} of {} tracks were not found on Spotify.",
                    report.total - report.matched,
                    report.total
                );
            }
            success!("Playlist created: {}", report.playlist_url);
            if open && webbrowser::open(&report.playlist_url).is_err() {
                warning!("Failed to open browser.");
            }
        }
        Ok(SyncOutcome::LoginRequired(auth_url)) => {
            info!("Not connected to Spotify. Starting login...");
            if login_in_browser(Arc::clone(session.auth()), auth_url).await {
                success!("Authentication successful! Run vibesync export again.");
            } else {
                error!("Authentication failed or timed out.");
            }
        }
        Err(e) => error!("{}", e),
    }
}

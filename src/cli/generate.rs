use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    cli::open_session, error, info, success,
    types::{GenerationResult, PlaylistPreferences},
    utils, warning,
};

pub async fn generate(prefs: PlaylistPreferences, cover_out: Option<PathBuf>) {
    if let Err(e) = prefs.validate() {
        error!("{}", e);
    }

    let mut session = match open_session().await {
        Ok(session) => session,
        Err(e) => error!("Cannot open session. Err: {}", e),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Curating {} tracks...", prefs.genre));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let result = match session.generate(&prefs).await {
        Ok(result) => result.clone(),
        Err(e) => {
            pb.finish_and_clear();
            // set only when the tracks were generated but history was not saved
            if let Some(unsaved) = session.current() {
                print_result(unsaved);
                error!("Playlist was not saved to history. Err: {}", e);
            }
            error!("{}", e);
        }
    };
    pb.finish_and_clear();

    print_result(&result);

    if !result.has_cover() {
        warning!("Continuing without AI cover image.");
    } else if let Some(path) = cover_out {
        write_cover(&result, &path).await;
    }

    success!("Saved to history. Run vibesync export to send it to Spotify.");
}

pub(crate) fn print_result(result: &GenerationResult) {
    info!("{}", result.playlist_name);
    println!("{}\n", result.playlist_description);

    let table = Table::new(utils::build_track_rows(&result.tracks));
    println!("{}", table);
}

async fn write_cover(result: &GenerationResult, path: &Path) {
    let Some(cover) = result.cover_image.as_deref() else {
        return;
    };

    let bytes = match STANDARD.decode(utils::strip_data_uri_prefix(cover)) {
        Ok(bytes) => bytes,
        Err(e) => {
            warning!("Cover image is not valid base64: {}", e);
            return;
        }
    };

    match async_fs::write(path, bytes).await {
        Ok(()) => success!("Cover written to {}", path.display()),
        Err(e) => warning!("Failed to write cover to {}: {}", path.display(), e),
    }
}

use std::fs;
use std::path::Path;

use env_logger::{Builder, Target};
use log::{error, info, warn, LevelFilter};

use ppv_m3u_lib::api::PpvClient;
use ppv_m3u_lib::config::{EPG_DIR, M3U_DIR, MIRRORS};
use ppv_m3u_lib::generator::{self, PlaylistBundle, Variant};

fn init_logger() {
    let mut builder = Builder::from_default_env();
    builder.target(Target::Stdout);
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(LevelFilter::Info);
    }
    builder.init();
}

/// Probes the mirror list in order and returns a client for the first one
/// that answers the liveness check.
async fn select_mirror() -> Option<PpvClient> {
    for mirror in MIRRORS {
        let client = PpvClient::new(mirror);
        if client.is_working().await {
            info!("Mirror {} is working.", client.base_url);
            return Some(client);
        }
        info!(
            "Mirror {} is not working; trying another mirror...",
            client.base_url
        );
    }
    None
}

fn write_bundle(stem: &str, bundle: &PlaylistBundle) -> std::io::Result<()> {
    fs::write(Path::new(M3U_DIR).join(format!("{stem}.m3u")), &bundle.m3u)?;
    fs::write(Path::new(EPG_DIR).join(format!("{stem}.xml")), &bundle.epg)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logger();

    fs::create_dir_all(M3U_DIR)?;
    fs::create_dir_all(EPG_DIR)?;

    let Some(client) = select_mirror().await else {
        warn!("No working mirror found; nothing generated.");
        return Ok(());
    };

    for variant in Variant::ALL {
        let stem = variant.file_stem();
        info!("Generating playlist \"{stem}\"...");
        match generator::generate(&client, variant).await {
            Ok(bundle) => match write_bundle(stem, &bundle) {
                Ok(()) => info!("Saved playlist and guide for \"{stem}\"."),
                Err(err) => error!("Failed to write \"{stem}\" outputs: {err}"),
            },
            Err(err) => error!("Failed to generate playlist \"{stem}\": {err}"),
        }
    }

    Ok(())
}

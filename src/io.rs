use anyhow::{bail, Context};
use base64::Engine;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};

use crate::types::{DetailResult, EncodedImage, ImageHandle};

/// Turns raw upload bytes into the transportable form sent to the model.
pub fn encode_image(bytes: &[u8]) -> anyhow::Result<EncodedImage> {
    if bytes.is_empty() {
        bail!("image is empty");
    }
    let format = image::guess_format(bytes).context("unrecognised image format")?;
    let mime_type = match format {
        image::ImageFormat::Png => "image/png",
        image::ImageFormat::Jpeg => "image/jpeg",
        image::ImageFormat::WebP => "image/webp",
        image::ImageFormat::Gif => "image/gif",
        other => bail!("unsupported image format: {other:?}"),
    };
    Ok(EncodedImage {
        mime_type: mime_type.to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

#[derive(Serialize)]
struct DetailEntry<'a> {
    file: String,
    focus_point: &'a str,
    caption: &'a str,
}

#[derive(Serialize)]
struct Sidecar<'a> {
    id: &'a str,
    style: &'a str,
    description: &'a str,
    poster: String,
    details: Vec<DetailEntry<'a>>,
    created_at: String,
}

/// A finished generation ready to be written to disk.
pub struct Export<'a> {
    pub id: &'a str,
    pub style: &'a str,
    pub description: &'a str,
    pub poster: &'a ImageHandle,
    pub details: &'a [DetailResult],
}

/// Writes poster, close-ups and a JSON sidecar into `out_dir`. Returns the sidecar path.
pub async fn save_output(out_dir: &Path, export: &Export<'_>) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(out_dir).await?;

    let poster_name = format!("{}-poster.{}", export.id, export.poster.extension());
    write_atomic(&out_dir.join(&poster_name), &export.poster.decode()?).await?;

    let mut details = Vec::with_capacity(export.details.len());
    for (i, d) in export.details.iter().enumerate() {
        let name = format!("{}-detail-{}.{}", export.id, i + 1, d.image.extension());
        write_atomic(&out_dir.join(&name), &d.image.decode()?).await?;
        details.push(DetailEntry { file: name, focus_point: &d.focus_point, caption: &d.caption });
    }

    let sidecar = Sidecar {
        id: export.id,
        style: export.style,
        description: export.description,
        poster: poster_name,
        details,
        created_at: Utc::now().to_rfc3339(),
    };
    let json = out_dir.join(format!("{}.json", export.id));
    write_atomic(&json, &serde_json::to_vec_pretty(&sidecar)?).await?;
    Ok(json)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let mut f = fs::File::create(&tmp).await?;
        f.write_all(bytes).await?;
        let _ = f.sync_all().await; // best-effort
    }
    fs::rename(&tmp, path).await?;
    Ok(())
}

use crate::drive::{find_image_column, resolve_image_link};
use crate::error::ConfigError;
use crate::table::{NAME_COLUMN, Table};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How gallery images reach the browser.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// The browser fetches the resolved link itself.
    #[default]
    Link,
    /// The server fetches and decodes the image and embeds it in the page.
    Inline,
}

impl FromStr for ImageMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "link" => Ok(ImageMode::Link),
            "inline" => Ok(ImageMode::Inline),
            other => Err(ConfigError::InvalidImageMode(other.to_string())),
        }
    }
}

/// One gallery entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ImageTile {
    /// Position of the row in the snapshot.
    pub row: usize,
    pub caption: String,
    /// Link as written in the worksheet.
    pub link: String,
    /// What the page should put in `<img src>`; absent when loading failed.
    pub src: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub warning: Option<String>,
}

/// Tiles for every row with a non-blank image link, sources left as resolved links.
pub fn link_tiles(table: &Table) -> Vec<ImageTile> {
    let Some(column) = find_image_column(&table.columns) else {
        return Vec::new();
    };

    (0..table.rows.len())
        .filter_map(|index| {
            let link = table.value(index, column)?.trim();
            if link.is_empty() {
                return None;
            }
            Some(ImageTile {
                row: index,
                caption: table.value(index, NAME_COLUMN).unwrap_or_default().to_string(),
                link: link.to_string(),
                src: Some(resolve_image_link(link)),
                ..ImageTile::default()
            })
        })
        .collect()
}

#[cfg(feature = "web")]
mod inline {
    use super::ImageTile;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use image::{GenericImageView, ImageFormat};

    /// Decoded image ready for embedding.
    pub struct Embedded {
        pub data_uri: String,
        pub width: u32,
        pub height: u32,
    }

    fn mime_type(format: ImageFormat) -> &'static str {
        match format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Ico => "image/x-icon",
            ImageFormat::Tiff => "image/tiff",
            _ => "application/octet-stream",
        }
    }

    /// Check that `bytes` decode as an image and wrap them in a data URI.
    pub fn embed(bytes: &[u8]) -> Result<Embedded, image::ImageError> {
        let format = image::guess_format(bytes)?;
        let decoded = image::load_from_memory_with_format(bytes, format)?;
        let (width, height) = decoded.dimensions();

        Ok(Embedded {
            data_uri: format!("data:{};base64,{}", mime_type(format), STANDARD.encode(bytes)),
            width,
            height,
        })
    }

    async fn fetch(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Replace each tile's link source with embedded bytes.
    ///
    /// Failures stay on the tile as a warning.
    pub async fn inline_tiles(client: &reqwest::Client, tiles: Vec<ImageTile>) -> Vec<ImageTile> {
        let mut out = Vec::with_capacity(tiles.len());

        for mut tile in tiles {
            let Some(url) = tile.src.take() else {
                out.push(tile);
                continue;
            };

            let embedded = match fetch(client, &url).await {
                Ok(bytes) => embed(&bytes).map_err(|e| format!("cannot decode image: {}", e)),
                Err(e) => Err(format!("cannot fetch image: {}", e)),
            };

            match embedded {
                Ok(image) => {
                    tile.src = Some(image.data_uri);
                    tile.width = Some(image.width);
                    tile.height = Some(image.height);
                }
                Err(warning) => {
                    log::warn!("gallery row {}: {}", tile.row, warning);
                    tile.warning = Some(format!("Row {}: {}", tile.row + 1, warning));
                }
            }
            out.push(tile);
        }

        out
    }
}

#[cfg(feature = "web")]
pub use inline::{Embedded, embed, inline_tiles};

/// Gallery for a table in the given mode.
#[cfg(feature = "web")]
pub async fn build_gallery(mode: ImageMode, client: &reqwest::Client, table: &Table) -> Vec<ImageTile> {
    let tiles = link_tiles(table);
    match mode {
        ImageMode::Link => tiles,
        ImageMode::Inline => inline_tiles(client, tiles).await,
    }
}

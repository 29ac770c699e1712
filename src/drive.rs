use crate::error::SheetError;
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref FILE_ID_REGEX: Regex = Regex::new(r"/d/([A-Za-z0-9_-]+)(?:/|$)").unwrap();
    static ref SPREADSHEET_ID_REGEX: Regex =
        Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").unwrap();
}

/// Hosts that serve shared-drive viewer pages.
const DRIVE_HOSTS: [&str; 2] = ["drive.google.com", "docs.google.com"];

/// Words that mark an image-bearing column, strongest first.
const IMAGE_HINTS: [&str; 4] = ["image", "img", "photo", "picture"];

/// Unaccented Vietnamese words for picture; only tried when no English hint matches.
const LOCAL_IMAGE_HINTS: [&str; 2] = ["hinh", "anh"];

/// Byte-serving form of a shared-drive file.
pub fn direct_link(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=view&id={}", file_id)
}

/// Turn a shared-drive viewer link into a direct-fetch link.
///
/// Recognised shapes are `.../file/d/<id>/view`, any path containing
/// `/d/<id>/` or ending in `/d/<id>`, and `.../open?id=<id>`, all on a
/// drive host. Anything else comes back unchanged (trimmed).
///
/// # Examples
/// ```
/// use catalog::drive::resolve_image_link;
///
/// assert_eq!(
///     resolve_image_link("https://drive.google.com/file/d/1AbC_d-9/view?usp=sharing"),
///     "https://drive.google.com/uc?export=view&id=1AbC_d-9"
/// );
/// assert_eq!(resolve_image_link("https://example.com/a.png"), "https://example.com/a.png");
/// ```
pub fn resolve_image_link(link: &str) -> String {
    let trimmed = link.trim();
    let Ok(parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    let on_drive = parsed
        .host_str()
        .is_some_and(|host| DRIVE_HOSTS.contains(&host));
    if !on_drive {
        return trimmed.to_string();
    }

    if let Some(caps) = FILE_ID_REGEX.captures(parsed.path()) {
        return direct_link(&caps[1]);
    }

    if parsed.path() == "/open" {
        if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "id") {
            if !id.is_empty() {
                return direct_link(&id);
            }
        }
    }

    trimmed.to_string()
}

fn name_words(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

fn first_with_word<'a>(columns: &'a [String], hints: &[&str]) -> Option<&'a str> {
    columns
        .iter()
        .find(|c| name_words(c).iter().any(|word| hints.contains(&word.as_str())))
        .map(String::as_str)
}

/// Pick the column that holds image links.
///
/// Column names are split into words on `_`, `-` and whitespace, and a
/// hint must match a whole word, so `thanh_toan` is never taken for an
/// image column.
///
/// # Arguments
/// * `columns` - Header names in worksheet order
///
/// # Returns
/// * A column named exactly `image`, else the first column with an
///   English image word, else the first with a Vietnamese one
///
/// # Examples
/// ```
/// use catalog::drive::find_image_column;
///
/// let columns: Vec<String> = ["id", "thanh_toan", "image_link"].iter().map(|s| s.to_string()).collect();
/// assert_eq!(find_image_column(&columns), Some("image_link"));
/// ```
pub fn find_image_column(columns: &[String]) -> Option<&str> {
    if let Some(exact) = columns.iter().find(|c| c.as_str() == "image") {
        return Some(exact.as_str());
    }

    first_with_word(columns, &IMAGE_HINTS).or_else(|| first_with_word(columns, &LOCAL_IMAGE_HINTS))
}

/// Document id of a spreadsheet URL (`.../spreadsheets/d/<id>/edit`).
pub fn spreadsheet_id(url: &str) -> Result<String, SheetError> {
    SPREADSHEET_ID_REGEX
        .captures(url)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| SheetError::InvalidUrl(url.to_string()))
}

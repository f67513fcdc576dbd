use tracing::info;

use super::{IDA_PID_PREFIX, data_pids};
use crate::xml::Element;

pub const AVAA_DOWNLOAD_URL: &str = "https://avaa.tdata.fi/openida/dl.jsp?pid=";

const CHECKSUM_PATH: &[&str] = &["hasFormat", "File", "checksum", "Checksum", "checksumValue"];
const ALGORITHM_PATH: &[&str] = &["hasFormat", "File", "checksum", "Checksum", "generator", "Algorithm"];

pub fn checksum(dc: &Element) -> Option<String> {
    let Some(value) = dc.navigate(CHECKSUM_PATH) else {
        info!("checksum missing from dataset");
        return None;
    };
    value.text().map(str::to_string)
}

/// Last path segment of the checksum algorithm URI, e.g. `MD5`.
pub fn algorithm(dc: &Element) -> Option<String> {
    let about = dc.navigate(ALGORITHM_PATH)?.attr("about")?;
    about.rsplit('/').next().map(str::to_string)
}

/// Download URL candidates in priority order.
///
/// With `avaa` unset the `hasFormat/File@about` URL comes first, and the
/// IDA download link is only offered when that file entry exists.
pub fn download_urls(dc: &Element, avaa: bool) -> Vec<String> {
    let mut urls = Vec::new();

    let file_entry = if avaa {
        true
    } else {
        match dc.navigate(&["hasFormat", "File"]) {
            Some(file) => {
                urls.extend(file.attr("about").map(str::to_string));
                true
            }
            None => false,
        }
    };

    if file_entry {
        if let Some(ida_id) = dc.find("identifier").and_then(Element::text) {
            if ida_id.starts_with(IDA_PID_PREFIX) {
                urls.push(format!("{AVAA_DOWNLOAD_URL}{ida_id}"));
            }
        }
    }

    urls.extend(data_pids(dc).into_iter().filter(|pid| pid.starts_with("http")));
    urls
}

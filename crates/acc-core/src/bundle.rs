use rust_embed::Embed;
use std::path::PathBuf;

/// Label used as the root of the embedded tree in reports and logs.
pub const BUNDLE_LABEL: &str = "<bundled>";

#[derive(Embed)]
#[folder = "../../components/"]
struct Components;

/// Every embedded component as `(relative path, bytes)`.
pub fn files() -> Vec<(PathBuf, Vec<u8>)> {
    Components::iter()
        .filter_map(|name| {
            let file = <Components as Embed>::get(&name)?;
            Some((PathBuf::from(name.as_ref()), file.data.into_owned()))
        })
        .collect()
}

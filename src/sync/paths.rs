use std::path::{Path, PathBuf};

/// Folder name for a thing: `_` becomes a space, `:` and `/` become `-`, then
/// surrounding whitespace is trimmed. Names that reduce to nothing usable fall
/// back to `thing-{id}`.
///
/// Distinct names can map to the same folder ("a_b" and "a b"); the second
/// thing is then treated as already synced.
pub fn cleaned_folder_name(name: &str, id: u64) -> String {
    let cleaned = name.replace('_', " ").replace([':', '/'], "-");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return format!("thing-{}", id);
    }
    cleaned.to_string()
}

/// Strip path separators from a server-supplied file name so it stays inside
/// its target directory.
pub fn clean_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .collect();
    match cleaned.trim() {
        "." | ".." => String::new(),
        trimmed => trimmed.to_string(),
    }
}

/// Last path segment of a URL, without its query string.
pub fn filename_from_url(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query.rsplit('/').next().unwrap_or(without_query)
}

/// Split `name` into stem and extension. Leading-dot names have no extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], Some(&name[dot + 1..])),
        _ => (name, None),
    }
}

/// Contents of a Windows `.url` shortcut pointing at `url`.
pub fn shortcut_contents(url: &str) -> String {
    format!("[InternetShortcut]\nURL={}\n", url)
}

pub fn id_file(thing_dir: &Path, id: u64) -> PathBuf {
    thing_dir.join(format!("{}.id", id))
}

pub fn shortcut_file(thing_dir: &Path, id: u64) -> PathBuf {
    thing_dir.join(format!("{}.url", id))
}

pub fn ancestors_file(thing_dir: &Path, id: u64) -> PathBuf {
    thing_dir.join(format!("{}.ancestors", id))
}

/// Sibling temp path used while a download is in flight.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

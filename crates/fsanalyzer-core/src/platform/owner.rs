/// Owner resolution for entry records.
///
/// On Unix the owning uid comes from the same `symlink_metadata` read the
/// extractor already performed; the uid → user-name lookup goes through
/// `uzers` and is cached for the life of the process, since a walk touches
/// the same few owners over and over. Other platforms report no owner and
/// the extractor falls back to the `"unknown"` sentinel.
use compact_str::CompactString;
use std::fs::Metadata;

#[cfg(unix)]
mod unix {
    use compact_str::{CompactString, ToCompactString};
    use parking_lot::RwLock;
    use std::collections::HashMap;
    use std::sync::LazyLock;

    static OWNER_CACHE: LazyLock<RwLock<HashMap<u32, CompactString>>> =
        LazyLock::new(|| RwLock::new(HashMap::new()));

    /// Users without a passwd entry are reported by numeric uid.
    pub fn user_name(uid: u32) -> CompactString {
        if let Some(name) = OWNER_CACHE.read().get(&uid) {
            return name.clone();
        }
        let name = uzers::get_user_by_uid(uid)
            .map(|u| CompactString::new(u.name().to_string_lossy()))
            .unwrap_or_else(|| uid.to_compact_string());
        OWNER_CACHE.write().insert(uid, name.clone());
        name
    }
}

/// Best-effort owner name for an entry whose metadata was already read.
#[cfg(unix)]
pub fn owner_name(meta: &Metadata) -> Option<CompactString> {
    use std::os::unix::fs::MetadataExt;
    Some(unix::user_name(meta.uid()))
}

#[cfg(not(unix))]
pub fn owner_name(_meta: &Metadata) -> Option<CompactString> {
    None
}

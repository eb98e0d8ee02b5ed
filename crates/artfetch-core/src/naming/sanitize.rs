//! The sanitizer itself: entity decoding, hostile-character replacement,
//! segment cleanup, and platform length enforcement.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::NameError;
use super::platform::{Platform, UNIX_NAME_BYTES, WINDOWS_PATH_CHARS, is_reserved_device};

/// Characters that are replaced with `_` wherever they appear.
const HOSTILE: [char; 7] = ['?', ':', '<', '>', '|', '*', '"'];

/// Characters trimmed from both ends of every path segment. Tabs and
/// newlines are already gone by the time segments are cleaned (control
/// characters are dropped wholesale).
const SEGMENT_TRIM: [char; 2] = [' ', '.'];

/// Legalize a candidate name for the current platform.
///
/// See [`sanitize_for`] for the full contract.
pub fn sanitize(raw: &str, root: Option<&Path>) -> Result<PathBuf, NameError> {
    sanitize_for(Platform::current(), raw, root)
}

/// Legalize a candidate name under the given platform's rules.
///
/// The transformation, in order:
/// 1. decode HTML entities (titles frequently arrive escaped),
/// 2. replace the hostile character set with `_` (an empty candidate becomes
///    a single `_`),
/// 3. drop Unicode control characters,
/// 4. per separator-split segment: trim surrounding spaces, tabs, CR/LF and
///    periods, and prefix reserved device names with `_` (Windows rules
///    only),
/// 5. enforce the platform length ceiling, trimming the stem and never the
///    extension,
/// 6. resolve against `root` when one is given; `root` itself is taken as-is.
///
/// Sanitizing an already-sanitized name returns it unchanged.
pub fn sanitize_for(
    platform: Platform,
    raw: &str,
    root: Option<&Path>,
) -> Result<PathBuf, NameError> {
    let name = html_escape::decode_html_entities(raw).into_owned();

    let mut name: String = name
        .chars()
        .map(|c| if HOSTILE.contains(&c) { '_' } else { c })
        .filter(|c| !c.is_control())
        .collect();
    if name.is_empty() {
        name.push('_');
    }

    let sep = platform.separator();
    let cleaned: Vec<String> = name
        .split(sep)
        .map(|segment| {
            let trimmed = segment.trim_matches(|c| SEGMENT_TRIM.contains(&c));
            if platform == Platform::Windows && is_reserved_device(trimmed) {
                format!("_{trimmed}")
            } else {
                trimmed.to_string()
            }
        })
        .collect();
    name = cleaned.join(&sep.to_string());

    name = enforce_length(platform, name, root)?;

    let result = match root {
        Some(root) => absolute(root)
            .map_err(|e| NameError::Resolve {
                name: name.clone(),
                reason: e.to_string(),
            })?
            .join(&name),
        None => PathBuf::from(&name),
    };

    debug!(sanitized = %result.display(), "sanitized file name");
    Ok(result)
}

fn enforce_length(
    platform: Platform,
    name: String,
    root: Option<&Path>,
) -> Result<String, NameError> {
    match platform {
        Platform::Windows => enforce_windows_ceiling(name, root),
        Platform::Unix => enforce_unix_ceiling(name),
    }
}

/// Windows caps the whole path at 255 characters. The relative name is
/// trimmed (stem only) so the full path fits; losing the entire stem is
/// fatal rather than silently producing an extension-only name.
fn enforce_windows_ceiling(name: String, root: Option<&Path>) -> Result<String, NameError> {
    let full = match root {
        Some(root) => absolute(root)
            .map_err(|e| NameError::Resolve {
                name: name.clone(),
                reason: e.to_string(),
            })?
            .join(&name),
        None => absolute(Path::new(&name)).map_err(|e| NameError::Resolve {
            name: name.clone(),
            reason: e.to_string(),
        })?,
    };

    if full.to_string_lossy().chars().count() <= WINDOWS_PATH_CHARS {
        return Ok(name);
    }

    let (stem, ext) = split_extension(&name);
    let keep = WINDOWS_PATH_CHARS.saturating_sub(ext.chars().count());
    let truncated: String = stem.chars().take(keep).collect();
    if truncated.is_empty() {
        return Err(NameError::PathTooLong { path: full });
    }
    Ok(format!("{truncated}{ext}"))
}

/// Unix filesystems cap the encoded name; trim the stem one character at a
/// time until the UTF-8 byte length fits.
fn enforce_unix_ceiling(mut name: String) -> Result<String, NameError> {
    while name.len() > UNIX_NAME_BYTES {
        let (stem, ext) = split_extension(&name);
        if stem.is_empty() {
            return Err(NameError::PathTooLong {
                path: PathBuf::from(name),
            });
        }
        let mut shorter: String = stem.to_string();
        shorter.pop();
        name = format!("{shorter}{ext}");
    }
    Ok(name)
}

/// Split a (possibly multi-segment) name into stem and extension, where the
/// extension is the final segment's suffix from its last `.`. A leading dot
/// does not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    let base_start = name.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let base = &name[base_start..];
    match base.rfind('.') {
        Some(i) if i > 0 => name.split_at(base_start + i),
        _ => (name, ""),
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        std::path::absolute(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unix(raw: &str) -> String {
        sanitize_for(Platform::Unix, raw, None)
            .unwrap()
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn hostile_characters_become_underscores() {
        assert_eq!(unix(r#"what?:is<this>|file*named""#), "what__is_this__file_named_");
    }

    #[test]
    fn html_entities_are_decoded_first() {
        assert_eq!(unix("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(unix("&lt;title&gt;"), "_title_");
    }

    #[test]
    fn control_characters_are_stripped() {
        assert_eq!(unix("art\u{0007}work\ttitle\r\n"), "artworktitle");
    }

    #[test]
    fn segments_lose_surrounding_spaces_and_periods() {
        assert_eq!(unix(" artist /  title. "), "artist/title");
    }

    #[test]
    fn empty_name_becomes_underscore() {
        assert_eq!(unix(""), "_");
    }

    #[test]
    fn reserved_device_segments_are_prefixed_on_windows() {
        let got = sanitize_for(Platform::Windows, "con\\art.png", None).unwrap();
        assert!(got.to_string_lossy().contains("_con"));
    }

    #[test]
    fn reserved_device_names_pass_through_on_unix() {
        assert_eq!(unix("con/art.png"), "con/art.png");
    }

    #[test]
    fn sanitizing_twice_is_a_fixpoint() {
        let once = unix("a &amp; b?/ weird name .png");
        assert_eq!(unix(&once), once);
    }

    #[test]
    fn windows_truncation_keeps_the_extension() {
        let root = Path::new("/srv/media");
        let long = format!("{}.png", "x".repeat(400));
        let got = sanitize_for(Platform::Windows, &long, Some(root)).unwrap();
        let name = got.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with(".png"));
        assert_eq!(name.chars().count(), 255);
    }

    #[test]
    fn windows_rejects_a_name_with_no_stem_left() {
        let root = Path::new("/srv/media");
        // An extension so long that nothing is left for the stem.
        let hopeless = format!("s.{}", "e".repeat(400));
        let err = sanitize_for(Platform::Windows, &hopeless, Some(root)).unwrap_err();
        assert!(matches!(err, NameError::PathTooLong { .. }));
    }

    #[test]
    fn unix_trims_the_stem_to_the_byte_ceiling() {
        let long = format!("{}.png", "あ".repeat(120)); // 360 bytes of stem
        let got = unix(&long);
        assert!(got.len() <= 249);
        assert!(got.ends_with(".png"));
        // Only whole characters were removed.
        assert!(got.trim_end_matches(".png").chars().all(|c| c == 'あ'));
    }

    #[test]
    fn root_is_joined_but_never_sanitized() {
        let root = Path::new("/data/with space?");
        let got = sanitize_for(Platform::Unix, "name?.png", Some(root)).unwrap();
        assert_eq!(got, Path::new("/data/with space?/name_.png"));
    }

    #[test]
    fn extension_splitting_ignores_leading_dots() {
        assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
        assert_eq!(split_extension("dir/archive.tar.gz"), ("dir/archive.tar", ".gz"));
        assert_eq!(split_extension("plain"), ("plain", ""));
    }
}

use std::path::Path;

use crate::usecases::user::ProfileEdit;

pub fn parse_profile_edit(s: &str) -> ::core::result::Result<ProfileEdit, String> {
    #[derive(::serde::Deserialize)]
    #[serde(deny_unknown_fields)]
    struct ProfileEditModel {
        display_name: Option<String>,
        bio: Option<String>,
        photo_url: Option<String>,
    }

    // --- parsing json ---

    let ProfileEditModel {
        display_name,
        bio,
        photo_url,
    } = serde_json::from_str(s).map_err(|e| e.to_string())?;

    // --- finalize ---

    Ok(ProfileEdit {
        display_name,
        bio,
        photo_url,
    })
}

/// Image type by file extension; `application/octet-stream` when unknown,
/// which the upload pre-check then refuses.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_edit_from_json() {
        let e = parse_profile_edit(r#"{"display_name":"Alice"}"#).unwrap();
        assert_eq!(e.display_name.as_deref(), Some("Alice"));
        assert!(e.bio.is_none());

        assert!(parse_profile_edit(r#"{"admin":true}"#).is_err());
        assert!(parse_profile_edit("nope").is_err());
    }

    #[test]
    fn mime_by_extension() {
        assert_eq!(guess_mime(Path::new("a/b.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("cat.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("notes.txt")), "application/octet-stream");
    }
}

use ammonia;

/// Clean user-authored text using the ammonia library.
///
/// Quiz titles, question statements and choice labels are authored by
/// teachers and rendered verbatim in student browsers, so they go through
/// whitelist-based sanitization: safe tags (like <b>, <p>) survive, dangerous
/// tags (like <script>, <iframe>) and attributes (like onclick) are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitizes company-authored rich text (job and company descriptions).
///
/// Whitelist based: formatting tags like <b>, <p>, <ul> survive, <script>
/// and <iframe> are dropped with their content, event-handler attributes are
/// stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

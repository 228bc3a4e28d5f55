/// Extracts the `max-age` directive, in seconds, from a `Cache-Control` value.
///
/// Unparsable, negative or non-finite values yield `None` so the caller keeps
/// its previous expiry. `s-maxage` is ignored.
pub fn max_age(header: &str) -> Option<f64> {
    header.split(',').find_map(|directive| {
        let (name, value) = directive.trim().split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }
        let seconds = value.trim().trim_matches('"').parse::<f64>().ok()?;
        (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
    })
}

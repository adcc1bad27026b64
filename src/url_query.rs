// Query-string merging for the scraper URL.
// Only the query component is touched; the rest of the URL is treated as opaque text.

use url::form_urlencoded;

/// Appends `extra` to the query of `url`, after any existing pairs.
///
/// Existing pairs are kept, including blank values (`a` becomes `a=`). Keys already present
/// are neither replaced nor deduplicated. Scheme, host, path and fragment are left untouched.
///
/// The whole query is re-encoded with WHATWG application/x-www-form-urlencoded rules, so
/// existing pairs may come back spelled differently (`~` becomes `%7E`, `*` stays literal)
/// while decoding to the same values.
pub fn augment<I, K, V>(url: &str, extra: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let (without_fragment, fragment) = match url.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (url, None),
    };
    let (base, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(form_urlencoded::parse(query.as_bytes()));
    for (k, v) in extra {
        serializer.append_pair(k.as_ref(), v.as_ref());
    }
    let new_query = serializer.finish();

    let mut out = String::with_capacity(url.len() + new_query.len() + 1);
    out.push_str(base);
    if !new_query.is_empty() {
        out.push('?');
        out.push_str(&new_query);
    }
    if let Some(frag) = fragment {
        out.push('#');
        out.push_str(frag);
    }
    out
}


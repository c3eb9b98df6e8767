//! Minimal scanning of the HTML and Atom documents returned by backends.
//!
//! The documents are machine generated and flat, so a string scanner is
//! enough. Nested elements with the same tag name are not supported.

/// An element found by [`elements`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element<'a> {
    /// Everything between the tag name and the closing `>` of the start tag.
    pub attrs: &'a str,
    /// Everything between the start tag and the matching end tag.
    pub inner: &'a str,
}

impl<'a> Element<'a> {
    /// Whether the `class` attribute lists `class`.
    pub fn has_class(&self, class: &str) -> bool {
        attr(self.attrs, "class")
            .is_some_and(|value| value.split_whitespace().any(|c| c == class))
    }

    /// Returns the first child element named `tag`.
    #[inline]
    pub fn child(&self, tag: &str) -> Option<Element<'a>> {
        elements(self.inner, tag).next()
    }

    /// Returns the text of the first child element named `tag`, with tags
    /// stripped and whitespace collapsed.
    pub fn child_text(&self, tag: &str) -> Option<String> {
        self.child(tag).map(|el| collapse_whitespace(&strip_tags(el.inner)))
    }
}

/// Iterates over the elements named `tag` in document order.
pub fn elements<'a>(
    doc: &'a str,
    tag: &str,
) -> impl Iterator<Item = Element<'a>> + use<'a> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut pos = 0;
    std::iter::from_fn(move || {
        loop {
            let start = pos + doc[pos..].find(&open)?;
            let after_name = start + open.len();
            // `<entry` must not match `<entryfoo`.
            let boundary = doc[after_name..].chars().next()?;
            if !(boundary == '>' || boundary == '/' || boundary.is_whitespace())
            {
                pos = after_name;
                continue;
            }
            let tag_end = after_name + doc[after_name..].find('>')?;
            let attrs = doc[after_name..tag_end].trim();
            if attrs.ends_with('/') {
                pos = tag_end + 1;
                return Some(Element {
                    attrs: attrs.trim_end_matches('/').trim_end(),
                    inner: "",
                });
            }
            let inner_start = tag_end + 1;
            let inner_end = inner_start + doc[inner_start..].find(&close)?;
            pos = inner_end + close.len();
            return Some(Element {
                attrs,
                inner: &doc[inner_start..inner_end],
            });
        }
    })
}

/// Returns the decoded value of attribute `name` in a start tag.
pub fn attr(attrs: &str, name: &str) -> Option<String> {
    let pattern = format!("{name}=");
    let mut rest = attrs;
    loop {
        let idx = rest.find(&pattern)?;
        let preceded_ok = rest[..idx]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace);
        rest = &rest[idx + pattern.len()..];
        if !preceded_ok {
            continue;
        }
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            return Some(decode_entities(&rest[..end]));
        }
        let end = rest[1..].find(quote)?;
        return Some(decode_entities(&rest[1..1 + end]));
    }
}

/// Removes tags and decodes entities.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    decode_entities(&out)
}

/// Decodes the named entities common in search results and all numeric
/// character references. Unknown entities are kept as is.
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| Some((decode_entity(&rest[1..semi])?, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Joins all whitespace runs into single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

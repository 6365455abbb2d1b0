/// Ordered metadata multimap with case-insensitive key lookup.
///
/// Emission preserves the spelling a key was first inserted with, so
/// encoded messages carry canonical names (`Ce-Id`) while decoding
/// accepts any casing the transport delivered (`ce-id`, `CE-ID`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under a key, creating the key if absent.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// All values under a key, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name)
            .map(|idx| self.entries[idx].1.as_slice())
    }

    /// The first value under a key, case-insensitive.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Ce-Id", "ABC-123");

        assert_eq!(headers.first("ce-id"), Some("ABC-123"));
        assert_eq!(headers.first("CE-ID"), Some("ABC-123"));
        assert!(headers.contains("cE-iD"));
        assert_eq!(headers.first("ce-type"), None);
    }

    #[test]
    fn multiple_values_accumulate_under_one_key() {
        let mut headers = Headers::new();
        headers.insert("Ce-Tags", "a");
        headers.insert("ce-tags", "b");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("ce-tags").unwrap(), ["a", "b"]);
    }

    #[test]
    fn iteration_preserves_insertion_order_and_spelling() {
        let headers: Headers = [("Ce-Specversion", "0.2"), ("Ce-Id", "ABC-123")]
            .into_iter()
            .collect();

        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Ce-Specversion", "Ce-Id"]);
    }
}

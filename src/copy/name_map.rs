/// Source names selected for a copy, with optional destination names.
///
/// An empty map selects every source object under its own name.
/// Otherwise only the listed source objects are copied, in list order.
///
/// ```
/// # use cds::copy::NameMap;
/// let names = NameMap::new(["time", "temp"]).rename("temp", "temperature");
/// assert_eq!(names.dest_name("temp"), Some("temperature"));
/// assert_eq!(names.dest_name("time"), Some("time"));
/// assert_eq!(names.dest_name("lat"), None);
/// assert_eq!(NameMap::all().dest_name("lat"), Some("lat"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameMap {
    names: Vec<(String, Option<String>)>,
}

impl NameMap {
    /// Select every source object under its own name.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Select the source objects named `names`.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(|name| (name.into(), None)).collect(),
        }
    }

    /// Select the source objects of parallel source and destination name lists.
    ///
    /// Source names past the end of `dest` keep their own name.
    #[must_use]
    pub fn from_lists<S: AsRef<str>, D: AsRef<str>>(src: &[S], dest: &[D]) -> Self {
        Self {
            names: src
                .iter()
                .enumerate()
                .map(|(index, name)| {
                    (
                        name.as_ref().to_string(),
                        dest.get(index).map(|dest| dest.as_ref().to_string()),
                    )
                })
                .collect(),
        }
    }

    /// Copy the source object `src` as `dest`, selecting it if it is not already selected.
    #[must_use]
    pub fn rename(mut self, src: &str, dest: &str) -> Self {
        match self.names.iter_mut().find(|(name, _)| name == src) {
            Some(entry) => entry.1 = Some(dest.to_string()),
            None => self.names.push((src.to_string(), Some(dest.to_string()))),
        }
        self
    }

    /// Returns true if every source object is selected.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the destination name of the source object `src`, or [`None`] if it is not selected.
    #[must_use]
    pub fn dest_name<'a>(&'a self, src: &'a str) -> Option<&'a str> {
        if self.is_all() {
            return Some(src);
        }
        self.names
            .iter()
            .find(|(name, _)| name == src)
            .map(|(name, dest)| dest.as_deref().unwrap_or(name))
    }

    /// Returns the destination name of `src`, which is `src` itself unless it is renamed.
    #[must_use]
    pub fn map_name<'a>(&'a self, src: &'a str) -> &'a str {
        self.dest_name(src).unwrap_or(src)
    }

    /// Returns the selected items of `items` (keyed by source name) with their destination names.
    pub(crate) fn select<T: Copy>(&self, items: &[(T, &str)]) -> Vec<(T, String)> {
        if self.is_all() {
            return items
                .iter()
                .map(|&(item, name)| (item, name.to_string()))
                .collect();
        }
        self.names
            .iter()
            .filter_map(|(src, dest)| {
                let &(item, name) = items.iter().find(|(_, name)| name == src)?;
                Some((item, dest.clone().unwrap_or_else(|| name.to_string())))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_map_select() {
        let items = [(0, "time"), (1, "lat"), (2, "lon")];
        assert_eq!(NameMap::all().select(&items).len(), 3);

        let names = NameMap::from_lists(&["lon", "missing", "time"], &["longitude"]);
        assert_eq!(
            names.select(&items),
            vec![(2, "longitude".to_string()), (0, "time".to_string())]
        );
        assert_eq!(names.map_name("lat"), "lat");
        assert_eq!(names.map_name("lon"), "longitude");
    }
}

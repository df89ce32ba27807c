/// Origins from which the contact form may be submitted.
///
/// An empty list admits every request, with or without `Origin` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedOrigins(Vec<String>);

impl AllowedOrigins {
    pub fn new(origins: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self(
            origins
                .into_iter()
                .map(|origin| origin.as_ref().trim().to_owned())
                .filter(|origin| !origin.is_empty())
                .collect(),
        )
    }

    pub fn allows(&self, origin: Option<&str>) -> bool {
        self.0.is_empty() || origin.is_some_and(|origin| self.0.iter().any(|x| x == origin))
    }

    /// The origin advertised in `Access-Control-Allow-Origin`.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

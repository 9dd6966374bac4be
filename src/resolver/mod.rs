pub mod normalize;
pub mod table;

use anyhow::Result;

pub use normalize::normalize_name;
pub use table::TableResolver;

/// Maps a free-text country name to an ISO 3166-1 alpha-2 code.
///
/// `Ok(None)` means "no match". `Err` is reserved for the resolver itself
/// failing and aborts whatever is driving it.
pub trait CountryResolver {
    fn resolve(&self, name: &str) -> Result<Option<String>>;
}

impl<T: CountryResolver + ?Sized> CountryResolver for &T {
    fn resolve(&self, name: &str) -> Result<Option<String>> {
        (**self).resolve(name)
    }
}

impl<T: CountryResolver + ?Sized> CountryResolver for Box<T> {
    fn resolve(&self, name: &str) -> Result<Option<String>> {
        (**self).resolve(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl CountryResolver for Fixed {
        fn resolve(&self, _name: &str) -> Result<Option<String>> {
            Ok(Some(self.0.to_string()))
        }
    }

    fn lookup_via<C: CountryResolver>(resolver: C, name: &str) -> Result<Option<String>> {
        resolver.resolve(name)
    }

    #[test]
    fn test_forwarding_impls() -> Result<()> {
        let fixed = Fixed("AQ");
        assert_eq!(lookup_via(&fixed, "Antarctica")?.as_deref(), Some("AQ"));

        let boxed: Box<dyn CountryResolver> = Box::new(TableResolver::builtin()?);
        assert_eq!(lookup_via(&boxed, "Peru")?.as_deref(), Some("PE"));
        assert_eq!(lookup_via(boxed, "Atlantis")?, None);

        assert!(TableResolver::default().is_empty());
        assert_eq!(lookup_via(TableResolver::default(), "Peru")?, None);
        Ok(())
    }
}

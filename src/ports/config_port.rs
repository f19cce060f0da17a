//! Configuration access port.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Keys present in `section`, empty when the section is absent.
    fn keys(&self, section: &str) -> Vec<String>;

    fn has_section(&self, section: &str) -> bool {
        !self.keys(section).is_empty()
    }
}

pub mod dates;
pub mod store;

pub use dates::resolve_date_inputs;
pub use store::FileStore;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

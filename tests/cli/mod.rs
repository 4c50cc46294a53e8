/// End-to-end tests of the pgshift binary on snapshot files.
///
/// None of them need a database: comparisons run on snapshots written into
/// a temporary directory, and `apply` is only exercised up to the point
/// where it would connect.
pub mod diff_snapshots;
pub mod generate_scripts;

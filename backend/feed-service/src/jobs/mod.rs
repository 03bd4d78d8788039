pub mod cache_janitor;

pub mod config;
pub mod context;
pub mod errorpage;
pub mod latin;
pub mod listing;
pub mod locate;
pub mod markdown;
pub mod nav;
pub mod page;
pub mod paths;
pub mod pipeline;
pub mod template;

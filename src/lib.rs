//! Interactive chessboard: the board logic behind a page where two players
//! take turns by clicking or dragging pieces.
//!
//! The [`Controller`] turns gestures into moves and keeps the transient
//! interaction state, the [`chess`] module is the rules engine it consults
//! (through the [`rules::Rules`] contract) and [`view`] derives the square
//! highlights and draws the board.
//!
//! ```
//! use chessboard::chess::core::Square;
//! use chessboard::Controller;
//!
//! let mut board: Controller = Controller::default();
//! let _ = board.select_square(Square::E2);
//! let _ = board.select_square(Square::E4);
//! assert_eq!(
//!     board.fen(),
//!     "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
//! );
//! ```

#![warn(missing_docs, variant_size_differences)]
// Rustc lints.
#![warn(
    absolute_paths_not_starting_with_crate,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]
// Rustdoc lints.
#![warn(
    rustdoc::private_doc_tests,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::bare_urls
)]
// Clippy lints.
#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![deny(clippy::perf)]

pub mod chess;
pub mod controller;
pub mod rules;
pub mod shell;
pub mod view;

pub use controller::Controller;
pub use shell::Shell;
use shadow_rs::shadow;

shadow!(build);

/// Package version with the commit and branch it was built from.
#[must_use]
pub fn version() -> String {
    format!(
        "{} (commit {}, branch {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BRANCH
    )
}

/// Prints the version to stderr, with a warning for builds of a dirty tree.
pub fn print_build_info() {
    eprintln!("chessboard {}", version());
    if !shadow_rs::git_clean() {
        eprintln!("Warning: built with uncommitted changes");
    }
}

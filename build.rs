//! Retrieves information about the version of the crate from Git and the build
//! environment. `shadow-rs` writes it to the output directory so that the shell
//! can report how it was built.

fn main() -> shadow_rs::SdResult<()> {
    shadow_rs::new()
}

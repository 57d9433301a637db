/// Packaging rewritten files into `.wotmod` archives
pub mod archive;
/// gettext translation catalogs and `#catalog:key` references
pub mod catalog;
/// Locations of game data and the startup load sequence
pub mod config;
/// Error definitions
pub mod error;
/// Turning a set of requested crew swaps into a modpack
pub mod modpack;
/// Rewriting a nation's crew file for a set of swaps
pub mod substitute;
/// Premium crew members and the nation files they come from
pub mod tankmen;
/// Special voice-over tags
pub mod voices;
/// Recovering XML parser with span-preserving text edits
pub mod xml;

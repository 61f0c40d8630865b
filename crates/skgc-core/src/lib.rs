mod console;
mod correlator;
mod edition;
mod error;
mod installation;
mod liveness;
mod properties;
mod server_record;
mod state_store;
mod supervisor;
mod update;

#[cfg(test)]
mod tests;

pub use console::{CommandBuffer, ConsoleLog, ConsoleRelay, RelayHandle};
pub use correlator::{
    CommandCorrelator, Coordinate, find_response, parse_teleport_line, teleport_command,
};
pub use edition::Edition;
pub use error::{Result, SupervisorError};
pub use installation::InstallationPaths;
pub use liveness::{LivenessOracle, OsLiveness, is_process_running};
pub use properties::PropertiesFile;
pub use server_record::ServerRecord;
pub use state_store::StateStore;
pub use supervisor::{ServerManager, StatusReport};
pub use update::{
    BEDROCK_ARCHIVE, BEDROCK_PRESERVED, Downloader, HttpDownloader, JAVA_ARTIFACT,
    update_bedrock_server, update_java_server,
};

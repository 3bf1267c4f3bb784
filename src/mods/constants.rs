pub const SPIN_UP: i8 = 1;
pub const SPIN_DOWN: i8 = -1;

pub const CONFIG_FILE_NAME: &str = "IsingSettings.ini";
pub const RUN_INFO_FILE_NAME: &str = "RunInfo.ini";
pub const SIM_LOG_FILE_NAME: &str = "SimLog.txt";
pub const STATE_FILE_PREFIX: &str = "State_";
pub const STATE_FILE_EXT: &str = "txt";
pub const COMMENT_LINE: &str = "/////////////////////////////// | GENERAL INFO | ///////////////////////////////";

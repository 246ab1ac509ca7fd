mod config_tests;
mod history_tests;
mod message_tests;

mod test_app;
mod test_engine;
mod test_monitor;
mod test_settings;

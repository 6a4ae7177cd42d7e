pub trait Configuration: Clone + Send + Sync + 'static {
    fn website_title(&self) -> String;
    fn admin_password(&self) -> String;
    fn port(&self) -> String;
    fn database_url(&self) -> Option<String>;
    /// How many days ahead (including today) the public date picker offers.
    fn booking_window_days(&self) -> u32;
}

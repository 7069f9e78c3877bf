pub mod checkout_asset_cmd;
pub mod checkin_asset_cmd;
pub mod place_hold_cmd;
pub mod mark_lost_cmd;
pub mod mark_found_cmd;

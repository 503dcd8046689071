pub mod badges;
pub mod detail_view;
pub mod filters;
pub mod header;
pub mod movie_grid;
pub mod settings_modal;
pub mod toast;
pub mod trending_row;

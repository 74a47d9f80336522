pub mod board_export;

pub mod d400_system_health;

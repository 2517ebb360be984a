use broadside::{
    index_from_position, position_from_index, Board, BoardError, CellState, Orientation,
    BOARD_SIZE,
};

#[test]
fn test_new_board_is_empty() {
    let board = Board::new();
    assert_eq!(board.size(), BOARD_SIZE as usize);
    assert_eq!(board.cells().len(), 100);
    assert_eq!(board.count(CellState::Empty), 100);
    assert!(!board.has_ship());
    assert!(board.check_invariant().is_ok());
}

#[test]
fn test_position_index_conversion() {
    assert_eq!(position_from_index(0, 10), (0, 0));
    assert_eq!(position_from_index(9, 10), (9, 0));
    assert_eq!(position_from_index(10, 10), (0, 1));
    assert_eq!(position_from_index(57, 10), (7, 5));
    assert_eq!(index_from_position(7, 5, 10), 57);
    assert_eq!(index_from_position(9, 9, 10), 99);
}

#[test]
fn test_stamp_horizontal_ship() {
    let mut board = Board::new();
    board.stamp_ship(index_from_position(2, 3, 10), 4, Orientation::Horizontal);
    for x in 2..6 {
        assert_eq!(board.cell(index_from_position(x, 3, 10)), Some(CellState::Ship));
    }
    assert_eq!(board.cell(index_from_position(6, 3, 10)), Some(CellState::Empty));
    assert_eq!(board.count(CellState::Ship), 4);
}

#[test]
fn test_stamp_vertical_ship() {
    let mut board = Board::new();
    board.stamp_ship(index_from_position(9, 0, 10), 3, Orientation::Vertical);
    for y in 0..3 {
        assert_eq!(board.cell(index_from_position(9, y, 10)), Some(CellState::Ship));
    }
    assert_eq!(board.count(CellState::Ship), 3);
}

#[test]
fn test_sanitized_view_hides_ships_only() {
    let mut board = Board::new();
    board.stamp_ship(0, 5, Orientation::Horizontal);
    board.set(0, CellState::DamagedShip).unwrap();
    board.set(50, CellState::Miss).unwrap();

    let view = board.sanitized_view();
    assert_eq!(view.count(CellState::Ship), 0);
    assert_eq!(view.cell(0), Some(CellState::DamagedShip));
    assert_eq!(view.cell(1), Some(CellState::Empty));
    assert_eq!(view.cell(50), Some(CellState::Miss));
    // source board untouched
    assert_eq!(board.count(CellState::Ship), 4);
}

#[test]
fn test_set_out_of_range() {
    let mut board = Board::new();
    assert_eq!(
        board.set(100, CellState::Miss).unwrap_err(),
        BoardError::InvalidIndex(100)
    );
    assert_eq!(board.cell(100), None);
}

#[test]
fn test_from_cells_checks_length() {
    let err = Board::from_cells(10, vec![CellState::Empty; 99]).unwrap_err();
    assert_eq!(
        err,
        BoardError::LengthMismatch {
            expected: 100,
            found: 99
        }
    );
    assert!(Board::from_cells(10, vec![CellState::Empty; 100]).is_ok());
}

#[test]
fn test_cell_codes() {
    assert_eq!(CellState::Empty as u8, 0);
    assert_eq!(CellState::Ship as u8, 1);
    assert_eq!(CellState::DamagedShip as u8, 2);
    assert_eq!(CellState::Miss as u8, 3);
}

#[test]
fn test_stamp_stops_at_edge() {
    let mut board = Board::new();
    board.stamp_ship(index_from_position(8, 0, 10), 4, Orientation::Horizontal);
    assert_eq!(board.count(CellState::Ship), 2);
    assert_eq!(board.cell(index_from_position(0, 1, 10)), Some(CellState::Empty));
}

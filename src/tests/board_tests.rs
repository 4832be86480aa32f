#[cfg(test)]
mod tests {
    use crate::board::Board;
    use crate::components::FlowId;
    use crate::config::loader::ConfigError;
    use crate::game::{BALL_BOMB, BALL_BOOM, BALL_JOKER, BOARD_H, BOARD_W, EMPTY, POOL_SIZE};
    use crate::tests::test_utils::TEST_SEED;
    use tempfile::tempdir;

    fn count_balls(board: &Board) -> usize {
        (0..BOARD_W)
            .flat_map(|x| (0..BOARD_H).map(move |y| (x, y)))
            .filter(|&(x, y)| board.cell(x, y) != EMPTY)
            .count()
    }

    #[test]
    fn test_init_fills_pool_and_drops_it() {
        let mut board = Board::with_seed(TEST_SEED);
        board.init();

        assert_eq!(count_balls(&board), 0);
        assert!((0..POOL_SIZE).all(|i| board.pool_cell(i) != EMPTY));
        assert_eq!(board.score(), 0);
        assert!(!board.is_settled());

        board.logic();
        assert_eq!(count_balls(&board), POOL_SIZE);
        assert!((0..POOL_SIZE).all(|i| board.pool_cell(i) == EMPTY));

        board.logic();
        assert!((0..POOL_SIZE).all(|i| board.pool_cell(i) != EMPTY));
    }

    #[test]
    fn test_select_and_move() {
        let mut board = Board::with_seed(TEST_SEED);
        board.set_cell(0, 0, 2);

        board.select(0, 0);
        assert_eq!(board.selected(), Some((0, 0)));

        board.select(0, 3);
        assert_eq!(board.selected(), None);
        assert_eq!(board.cell(0, 0), EMPTY);
        assert_eq!(board.cell(0, 3), 2);
        for y in 0..=3 {
            assert!(board.has_path(0, y), "square (0, {y}) should be on the path");
        }

        let request = board.take_move().expect("move published");
        assert_eq!(request.from, (0, 0));
        assert_eq!(request.to, (0, 3));
        assert_eq!(request.flow, FlowId::from_origin(0, 0));
        assert_eq!(board.take_move(), None);

        assert_eq!(board.follow_path(0, 0, request.flow), Some((0, 1)));
        board.clear_path(0, 0);
        assert_eq!(board.follow_path(0, 1, request.flow), Some((0, 2)));
    }

    #[test]
    fn test_moves_refused_while_path_marked() {
        let mut board = Board::with_seed(TEST_SEED);
        board.set_cell(0, 0, 2);
        board.set_cell(5, 5, 3);
        board.select(0, 0);
        board.select(1, 0);
        board.take_move();

        // Logic is still pending for the first move as well
        board.select(5, 5);
        board.select(5, 6);
        assert_eq!(board.cell(5, 5), 3);
        assert_eq!(board.take_move(), None);
    }

    #[test]
    fn test_cleared_selection_cannot_move() {
        let mut board = Board::with_seed(TEST_SEED);
        for x in 0..5 {
            board.set_cell(x, 1, 3);
        }
        board.select(1, 1);
        assert_eq!(board.selected(), Some((1, 1)));

        assert_eq!(board.remove_lines(&[(0, 1)]), 5);
        assert_eq!(board.selected(), None);

        board.select(4, 4);
        assert_eq!(board.take_move(), None);
        assert_eq!(board.cell(4, 4), EMPTY);
    }

    #[test]
    fn test_emptied_selection_is_refused() {
        let mut board = Board::with_seed(TEST_SEED);
        board.set_cell(2, 2, 5);
        board.select(2, 2);
        board.set_cell(2, 2, EMPTY);

        board.select(6, 6);

        assert_eq!(board.take_move(), None);
        assert_eq!(board.selected(), None);
        assert_eq!(board.cell(6, 6), EMPTY);
    }

    #[test]
    fn test_boom_forgets_selected_neighbour() {
        let mut board = Board::with_seed(TEST_SEED);
        board.set_cell(3, 3, 1);
        board.set_cell(4, 6, BALL_BOOM);
        board.select(4, 6);
        board.select(4, 4);
        board.take_move();
        board.select(3, 3);

        board.logic();

        assert_eq!(board.cell(3, 3), EMPTY);
        assert_eq!(board.selected(), None);
    }

    #[test]
    fn test_walled_in_ball_cannot_move() {
        let mut board = Board::with_seed(TEST_SEED);
        board.set_cell(0, 0, 1);
        board.set_cell(1, 0, 2);
        board.set_cell(0, 1, 2);

        board.select(0, 0);
        board.select(4, 4);

        assert_eq!(board.cell(0, 0), 1);
        assert_eq!(board.take_move(), None);
        assert_eq!(board.selected(), Some((0, 0)));
    }

    #[test]
    fn test_line_of_five_scores() {
        let mut board = Board::with_seed(TEST_SEED);
        for x in 0..5 {
            board.set_cell(x, 4, 6);
        }

        let removed = board.remove_lines(&[(2, 4)]);

        assert_eq!(removed, 5);
        assert_eq!(board.score(), 5);
        assert_eq!(board.score_mul(), 1);
        assert_eq!(count_balls(&board), 0);
    }

    #[test]
    fn test_four_in_a_row_stays() {
        let mut board = Board::with_seed(TEST_SEED);
        for y in 0..4 {
            board.set_cell(3, y, 1);
        }

        assert_eq!(board.remove_lines(&[(3, 0)]), 0);
        assert_eq!(count_balls(&board), 4);
    }

    #[test]
    fn test_joker_doubles_diagonal() {
        let mut board = Board::with_seed(TEST_SEED);
        for i in 0..5 {
            board.set_cell(i, i, 2);
        }
        board.set_cell(2, 2, BALL_JOKER);

        assert_eq!(board.remove_lines(&[(0, 0)]), 5);
        assert_eq!(board.score_mul(), 2);
        assert_eq!(board.score(), 10);
    }

    #[test]
    fn test_bomb_takes_whole_colour() {
        let mut board = Board::with_seed(TEST_SEED);
        for x in 0..5 {
            board.set_cell(x, 0, 4);
        }
        board.set_cell(4, 0, BALL_BOMB);
        board.set_cell(8, 8, 4);
        board.set_cell(7, 7, 5);

        assert_eq!(board.remove_lines(&[(0, 0)]), 6);
        assert_eq!(board.cell(8, 8), EMPTY);
        assert_eq!(board.cell(7, 7), 5);
    }

    #[test]
    fn test_boom_clears_neighbourhood() {
        let mut board = Board::with_seed(TEST_SEED);
        board.set_cell(3, 3, 1);
        board.set_cell(5, 3, 2);
        board.set_cell(4, 6, BALL_BOOM);
        board.select(4, 6);
        board.select(4, 4);
        board.take_move();

        board.logic();

        assert_eq!(board.cell(4, 4), EMPTY);
        assert_eq!(board.cell(3, 3), EMPTY);
        assert_eq!(board.cell(5, 3), EMPTY);
        assert_eq!(board.score(), 3);
    }

    #[test]
    fn test_full_board_is_not_running() {
        let mut board = Board::with_seed(TEST_SEED);
        for x in 0..BOARD_W {
            for y in 0..BOARD_H {
                board.set_cell(x, y, 1 + ((x + 2 * y) % 7) as u8);
            }
        }
        assert!(!board.running());

        board.set_cell(4, 4, EMPTY);
        assert!(board.running());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("save.toml");
        let mut board = Board::with_seed(TEST_SEED);
        board.init();
        board.logic();
        board.logic();
        board.set_cell(8, 0, BALL_JOKER);

        board.save(&path).expect("Failed to save board");
        let loaded = Board::load(&path).expect("Failed to load board");

        assert_eq!(loaded.snapshot(), board.snapshot());
        assert!(loaded.is_settled());
    }

    #[test]
    fn test_restore_rejects_bad_snapshots() {
        let board = Board::with_seed(TEST_SEED);

        let mut short = board.snapshot();
        short.cells.pop();
        assert!(matches!(Board::restore(&short), Err(ConfigError::Invalid(_))));

        let mut strange = board.snapshot();
        strange.pool[0] = 42;
        assert!(matches!(Board::restore(&strange), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_restored_empty_pool_restocks() {
        let mut board = Board::with_seed(TEST_SEED);
        board.init();
        board.logic();

        let mut restored = Board::restore(&board.snapshot()).expect("valid snapshot");
        assert!(!restored.is_settled());
        restored.logic();
        assert!((0..POOL_SIZE).all(|i| restored.pool_cell(i) != EMPTY));
    }

    #[test]
    fn test_missing_save_is_an_error() {
        let dir = tempdir().expect("Failed to create temp directory");
        assert!(Board::load(&dir.path().join("absent.toml")).is_err());
    }
}

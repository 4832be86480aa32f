#[cfg(test)]
mod tests {
    use crate::components::{BallGrid, Effect, Location};
    use crate::effects::DrawOp;
    use crate::render::{DrawList, FrameCanvas, Look, Sprite, dispatch};
    use crate::tests::test_utils::idle_record;

    #[test]
    fn test_rest_paints_and_clears() {
        let mut canvas = FrameCanvas::default();
        let at = Location::grid(3, 2);

        canvas.apply(&DrawOp::Rest { at, ball: 4 });
        assert_eq!(canvas.tile(at), Some(Sprite::solid(4)));

        canvas.apply(&DrawOp::Rest { at, ball: 0 });
        assert_eq!(canvas.tile(at), None);
    }

    #[test]
    fn test_effect_looks() {
        let mut canvas = FrameCanvas::default();
        let at = Location::pool(2);

        canvas.apply(&DrawOp::Grow { at, ball: 1, size: 5 });
        assert_eq!(canvas.tile(at).map(|s| s.look), Some(Look::Scaled(5)));

        canvas.apply(&DrawOp::Blend {
            at,
            from: 1,
            to: 6,
            alpha: 3,
        });
        assert_eq!(
            canvas.tile(at),
            Some(Sprite {
                ball: 6,
                dx: 0,
                dy: 0,
                look: Look::Blended { from: 1, alpha: 3 },
            })
        );

        canvas.apply(&DrawOp::Lift { at, ball: 6, dy: -4 });
        assert_eq!(canvas.tile(at).map(|s| (s.dy, s.look)), Some((-4, Look::Solid)));
    }

    #[test]
    fn test_glide_repaints_neighbours() {
        let mut canvas = FrameCanvas::default();
        canvas.board[0][0] = Some(Sprite::solid(2));
        canvas.board[2][0] = Some(Sprite::solid(2));

        canvas.apply(&DrawOp::Glide {
            at: (1, 0),
            ball: 2,
            dx: 12,
            dy: 0,
            trail: Some((0, 0)),
            ahead: Some((2, 0)),
        });

        assert_eq!(canvas.board[0][0], None);
        assert_eq!(canvas.board[2][0], None);
        assert_eq!(
            canvas.board[1][0].map(|s| (s.ball, s.dx)),
            Some((2, 12))
        );
    }

    #[test]
    fn test_dispatch_drains_the_list() {
        let mut canvas = FrameCanvas::default();
        let mut list = DrawList {
            ops: vec![
                DrawOp::Rest {
                    at: Location::grid(0, 0),
                    ball: 1,
                },
                DrawOp::Fade {
                    at: Location::grid(1, 0),
                    ball: 2,
                    alpha: 9,
                },
            ],
            busy: 1,
        };

        assert_eq!(dispatch(&mut canvas, &mut list), 2);
        assert!(list.ops.is_empty());
        assert_eq!(list.busy, 1);
        assert_eq!(
            canvas.board[1][0].map(|s| s.look),
            Some(Look::Faded(9))
        );

        assert_eq!(dispatch(&mut canvas, &mut list), 0);
    }

    #[test]
    fn test_redraw_shows_resting_balls_only() {
        let mut grid = BallGrid::new();
        grid.cells[4][4] = idle_record(Location::grid(4, 4), 3);
        grid.cells[5][5] = idle_record(Location::grid(5, 5), 6);
        grid.cells[5][5].enable_effect(Effect::Appearing);
        grid.pool[0] = idle_record(Location::pool(0), 9);

        let mut canvas = FrameCanvas::default();
        canvas.board[8][8] = Some(Sprite::solid(1));
        canvas.redraw(&grid);

        assert_eq!(canvas.board[4][4], Some(Sprite::solid(3)));
        assert_eq!(canvas.board[5][5], None);
        assert_eq!(canvas.board[8][8], None);
        assert_eq!(canvas.pool[0], Some(Sprite::solid(9)));
    }
}

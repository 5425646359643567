use std::cell::Cell;


use super::*;
use crate::cost::{Cost, CostModel, TieBreak};
use crate::render::Renderer;
use crate::width::CharCount;

fn solve_with(arena: &BlockArena, root: BlockId, margin: usize, model: &CostModel) -> Layout {
    Solver::new(arena, &CharCount, model)
        .evaluate(root, Context::new(margin))
        .unwrap()
}

fn solve(arena: &BlockArena, root: BlockId, margin: usize) -> Layout {
    solve_with(arena, root, margin, &CostModel::default())
}

fn lines(arena: &BlockArena, layout: &Layout) -> Vec<String> {
    Renderer::new(arena).materialize(layout)
}

fn texts(arena: &mut BlockArena, contents: &[&str]) -> Vec<BlockId> {
    contents
        .iter()
        .map(|content| arena.text(*content).unwrap())
        .collect()
}

fn approx(cost: Cost, expected: f64) -> bool {
    (cost.value() - expected).abs() < 1e-9
}

mod text_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fitting_text_is_free() {
        let mut arena = BlockArena::new();
        let hello = arena.text("hello").unwrap();
        let layout = solve(&arena, hello, 80);
        assert_eq!(layout.first_line_width, 5);
        assert_eq!(layout.height, 1);
        assert_eq!(layout.cost, Cost::ZERO);
    }

    #[test]
    fn overflowing_text_pays_squared_overflow() {
        let mut arena = BlockArena::new();
        let hello = arena.text("hello").unwrap();
        let layout = solve(&arena, hello, 3);
        assert!(approx(layout.cost, 400.0));
        assert_eq!(lines(&arena, &layout), vec!["hello"]);
    }

    #[test]
    fn verbatim_continues_then_restarts_at_column_zero() {
        let mut arena = BlockArena::new();
        let lhs = arena.text("x = ").unwrap();
        let raw = arena
            .verbatim(["\"\"\"", "  raw", "\"\"\""], false)
            .unwrap();
        let semi = arena.text(";").unwrap();
        let root = arena.line(&[lhs, raw, semi], 0).unwrap();

        let layout = solve(&arena, root, 80);
        assert_eq!(layout.height, 3);
        assert_eq!(layout.first_line_width, 7);
        assert_eq!(layout.last_line_width, 4);
        assert_eq!(
            lines(&arena, &layout),
            vec!["x = \"\"\"", "  raw", "\"\"\";"]
        );
    }
}

mod line_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn children_are_separated() {
        let mut arena = BlockArena::new();
        let items = texts(&mut arena, &["a", "bb", "ccc"]);
        let root = arena.line(&items, 1).unwrap();
        let layout = solve(&arena, root, 80);
        assert_eq!(layout.first_line_width, 8);
        assert_eq!(lines(&arena, &layout), vec!["a bb ccc"]);
    }

    #[test]
    fn multi_line_child_continues_the_line() {
        let mut arena = BlockArena::new();
        let open = arena.text("f(").unwrap();
        let args = texts(&mut arena, &["a", "b"]);
        let stack = arena.stack(&args).unwrap();
        let close = arena.text(")").unwrap();
        let root = arena.line(&[open, stack, close], 0).unwrap();

        let layout = solve(&arena, root, 80);
        assert_eq!(layout.height, 3);
        assert_eq!(layout.last_line_width, 2);
        assert!(approx(layout.cost, 4.0));
        assert_eq!(lines(&arena, &layout), vec!["f(", "a", "b)"]);
    }

    #[test]
    fn breaking_child_forces_a_break() {
        let mut arena = BlockArena::new();
        let comment = arena.breaking_text("// c").unwrap();
        let x = arena.text("x").unwrap();
        let root = arena.line(&[comment, x], 1).unwrap();

        let layout = solve(&arena, root, 80);
        assert!(approx(layout.cost, 2.0));
        assert_eq!(lines(&arena, &layout), vec!["// c", "x"]);
    }

    #[test]
    fn indented_stack_after_text_starts_on_a_new_line() {
        let mut arena = BlockArena::new();
        let head = arena.text("ab").unwrap();
        let items = texts(&mut arena, &["x", "y"]);
        let stack = arena.stack(&items).unwrap();
        let body = arena.indent(stack, 2).unwrap();
        let root = arena.line(&[head, body], 0).unwrap();

        let layout = solve(&arena, root, 80);
        assert_eq!(layout.height, 3);
        assert_eq!(lines(&arena, &layout), vec!["ab", "  x", "  y"]);
    }

    #[test]
    fn child_after_breaking_child_starts_a_line() {
        let mut arena = BlockArena::new();
        let comment = arena.breaking_text("// c").unwrap();
        let x = arena.text("x").unwrap();
        let indented = arena.indent(x, 2).unwrap();
        let root = arena.line(&[comment, indented], 1).unwrap();
        assert_eq!(
            lines(&arena, &solve(&arena, root, 80)),
            vec!["// c", "  x"]
        );
    }
}

mod stack_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn heights_add_up() {
        let mut arena = BlockArena::new();
        let items = texts(&mut arena, &["a", "b", "c", "d"]);
        let (a, b, c, d) = (items[0], items[1], items[2], items[3]);
        let inner = arena.stack(&[b, c]).unwrap();
        let root = arena.stack(&[a, inner, d]).unwrap();

        let layout = solve(&arena, root, 80);
        assert_eq!(layout.height, 4);
        assert!(approx(layout.cost, 6.0));
        assert_eq!(lines(&arena, &layout), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn break_mult_scales_breaks() {
        let mut arena = BlockArena::new();
        let items = texts(&mut arena, &["a", "b"]);
        let root = arena.stack_with_break_mult(&items, 3.0).unwrap();
        assert!(approx(solve(&arena, root, 80).cost, 6.0));
    }

    #[test]
    fn indent_at_line_start_pads_every_line() {
        let mut arena = BlockArena::new();
        let items = texts(&mut arena, &["a", "b"]);
        let stack = arena.stack(&items).unwrap();
        let root = arena.indent(stack, 2).unwrap();

        let layout = solve(&arena, root, 80);
        assert_eq!(layout.first_line_width, 3);
        assert_eq!(lines(&arena, &layout), vec!["  a", "  b"]);
    }

    #[test]
    fn indent_mid_line_applies_to_later_lines() {
        let mut arena = BlockArena::new();
        let lhs = arena.text("x = ").unwrap();
        let items = texts(&mut arena, &["a", "b"]);
        let stack = arena.stack(&items).unwrap();
        let body = arena.indent(stack, 2).unwrap();
        let root = arena.line(&[lhs, body], 0).unwrap();

        let layout = solve(&arena, root, 80);
        assert_eq!(lines(&arena, &layout), vec!["x = ", "  a", "  b"]);
    }
}

mod choice_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn inline_or_stacked(arena: &mut BlockArena) -> BlockId {
        let items = texts(arena, &["aaaa", "bbbb"]);
        let inline = arena.line(&items, 1).unwrap();
        let stacked = arena.stack(&items).unwrap();
        arena.choice(&[inline, stacked]).unwrap()
    }

    #[test]
    fn picks_the_cheapest_option() {
        let mut arena = BlockArena::new();
        let root = inline_or_stacked(&mut arena);
        assert_eq!(lines(&arena, &solve(&arena, root, 80)), vec!["aaaa bbbb"]);
        assert_eq!(
            lines(&arena, &solve(&arena, root, 5)),
            vec!["aaaa", "bbbb"]
        );
    }

    #[test]
    fn cost_is_minimum_over_options() {
        let mut arena = BlockArena::new();
        let items = texts(&mut arena, &["alpha", "beta", "gamma"]);
        let inline = arena.line(&items, 1).unwrap();
        let stacked = arena.stack(&items).unwrap();
        let wrapped = arena.wrap(&items, 1).unwrap();
        let root = arena.choice(&[inline, stacked, wrapped]).unwrap();

        for margin in [4, 10, 12, 40] {
            let best = solve(&arena, root, margin).cost;
            let min = [inline, stacked, wrapped]
                .into_iter()
                .map(|option| solve(&arena, option, margin).cost)
                .min()
                .unwrap();
            assert_eq!(best, min, "margin {margin}");
        }
    }

    #[test]
    fn equal_cost_and_height_keeps_first_option() {
        let mut arena = BlockArena::new();
        let options = texts(&mut arena, &["ab", "cd"]);
        let root = arena.choice(&options).unwrap();
        assert_eq!(lines(&arena, &solve(&arena, root, 80)), vec!["ab"]);
    }

    #[test]
    fn tie_break_policy_decides_equal_costs() {
        let mut arena = BlockArena::new();
        let items = texts(&mut arena, &["a", "b"]);
        let stacked = arena.stack(&items).unwrap();
        let inline = arena.line(&items, 0).unwrap();
        let root = arena.choice(&[stacked, inline]).unwrap();

        let free_breaks = CostModel::default().with_line_surcharge(0.0);
        let fewer_lines = solve_with(&arena, root, 80, &free_breaks);
        assert_eq!(lines(&arena, &fewer_lines), vec!["ab"]);

        let first_option = free_breaks.with_tie_break(TieBreak::FirstOption);
        let first = solve_with(&arena, root, 80, &first_option);
        assert_eq!(lines(&arena, &first), vec!["a", "b"]);
    }

    #[test]
    fn break_just_cheaper_than_one_column_of_overflow_wins() {
        let mut arena = BlockArena::new();
        let root = inline_or_stacked(&mut arena);

        // The inline option is 9 columns wide: one column over a margin of 8.
        let cheaper_break = CostModel::default().with_line_surcharge(99.0);
        let layout = solve_with(&arena, root, 8, &cheaper_break);
        assert!(approx(layout.cost, 99.0));
        assert_eq!(lines(&arena, &layout), vec!["aaaa", "bbbb"]);

        let dearer_break = CostModel::default().with_line_surcharge(101.0);
        let layout = solve_with(&arena, root, 8, &dearer_break);
        assert!(approx(layout.cost, 100.0));
        assert_eq!(lines(&arena, &layout), vec!["aaaa bbbb"]);
    }

    #[test]
    fn overflow_weight_scales_the_boundary() {
        let mut arena = BlockArena::new();
        let root = inline_or_stacked(&mut arena);

        let light_overflow = CostModel::default().with_overflow_weight(1.0);
        let layout = solve_with(&arena, root, 8, &light_overflow);
        assert!(approx(layout.cost, 1.0));
        assert_eq!(lines(&arena, &layout), vec!["aaaa bbbb"]);
    }

    #[test]
    fn margin_override_narrows_the_budget() {
        let mut arena = BlockArena::new();
        let inner = inline_or_stacked(&mut arena);
        let narrowed = arena.with_margin(inner, 5).unwrap();

        assert_eq!(lines(&arena, &solve(&arena, inner, 80)), vec!["aaaa bbbb"]);
        assert_eq!(
            lines(&arena, &solve(&arena, narrowed, 80)),
            vec!["aaaa", "bbbb"]
        );
    }
}

mod wrap_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fills_lines_up_to_margin() {
        let mut arena = BlockArena::new();
        let items = texts(&mut arena, &["aaa"; 5]);
        let root = arena.wrap(&items, 1).unwrap();

        let layout = solve(&arena, root, 11);
        assert!(approx(layout.cost, 2.002));
        assert_eq!(lines(&arena, &layout), vec!["aaa aaa aaa", "aaa aaa"]);
    }

    #[test]
    fn uses_the_fewest_breaks_that_fit() {
        let mut arena = BlockArena::new();
        let items = texts(&mut arena, &["aaaaa"; 5]);
        let root = arena.wrap(&items, 1).unwrap();

        let layout = solve(&arena, root, 11);
        assert_eq!(layout.height, 3);
        assert!(approx(layout.cost, 4.004));
        let rendered = lines(&arena, &layout);
        assert_eq!(rendered, vec!["aaaaa aaaaa", "aaaaa aaaaa", "aaaaa"]);
        assert!(rendered.iter().all(|line| line.len() <= 11));
    }

    #[test]
    fn equal_breaks_prefer_full_early_lines() {
        let mut arena = BlockArena::new();
        let items = texts(&mut arena, &["aaa", "bbb", "ccc"]);
        let root = arena.wrap(&items, 1).unwrap();
        assert_eq!(
            lines(&arena, &solve(&arena, root, 7)),
            vec!["aaa bbb", "ccc"]
        );
    }

    #[test]
    fn continuation_lines_align_with_the_wrap() {
        let mut arena = BlockArena::new();
        let open = arena.text("call(").unwrap();
        let args = texts(&mut arena, &["aa,", "bb,", "cc"]);
        let wrap = arena.wrap(&args, 1).unwrap();
        let close = arena.text(")").unwrap();
        let root = arena.line(&[open, wrap, close], 0).unwrap();

        let layout = solve(&arena, root, 12);
        assert!(approx(layout.cost, 2.001));
        assert_eq!(
            lines(&arena, &layout),
            vec!["call(aa, bb,", "     cc)"]
        );
    }

    #[test]
    fn first_child_of_mid_line_wrap_is_not_padded() {
        let mut arena = BlockArena::new();
        let open = arena.text("f(").unwrap();
        let a = arena.text("a").unwrap();
        let indented = arena.indent(a, 2).unwrap();
        let b = arena.text("b").unwrap();
        let wrap = arena.wrap(&[indented, b], 1).unwrap();
        let root = arena.line(&[open, wrap], 0).unwrap();
        assert_eq!(lines(&arena, &solve(&arena, root, 80)), vec!["f(a b"]);
    }

    #[test]
    fn prefix_opens_every_line() {
        let mut arena = BlockArena::new();
        let marker = arena.text("# ").unwrap();
        let words = texts(&mut arena, &["aaa", "bbb", "ccc"]);
        let root = arena.wrap_with_prefix(&words, 1, marker).unwrap();

        let layout = solve(&arena, root, 9);
        assert!(approx(layout.cost, 2.001));
        assert_eq!(lines(&arena, &layout), vec!["# aaa bbb", "# ccc"]);

        let model = CostModel::default();
        let greedy = Solver::new(&arena, &CharCount, &model)
            .with_wrap_strategy(WrapStrategy::Greedy)
            .evaluate(root, Context::new(9))
            .unwrap();
        assert_eq!(lines(&arena, &greedy), vec!["# aaa bbb", "# ccc"]);
    }

    #[test]
    fn prefix_width_counts_against_the_margin() {
        let mut arena = BlockArena::new();
        let marker = arena.text("// ").unwrap();
        let words = texts(&mut arena, &["aaa", "bbb"]);
        let plain = arena.wrap(&words, 1).unwrap();
        let prefixed = arena.wrap_with_prefix(&words, 1, marker).unwrap();

        assert_eq!(lines(&arena, &solve(&arena, plain, 7)), vec!["aaa bbb"]);
        assert_eq!(
            lines(&arena, &solve(&arena, prefixed, 7)),
            vec!["// aaa", "// bbb"]
        );
    }

    #[test]
    fn breaking_child_ends_the_line() {
        let mut arena = BlockArena::new();
        let comment = arena.breaking_text("x").unwrap();
        let y = arena.text("y").unwrap();
        let root = arena.wrap(&[comment, y], 1).unwrap();
        assert_eq!(lines(&arena, &solve(&arena, root, 80)), vec!["x", "y"]);
    }

    #[test]
    fn optimal_beats_greedy_when_lookahead_matters() {
        let mut arena = BlockArena::new();
        let head = arena.text("aaaa").unwrap();
        let long = arena.text("bbbbbbbb").unwrap();
        let half = arena.text("bbbb").unwrap();
        let split = arena.stack(&[half, half]).unwrap();
        let tail = arena.choice(&[long, split]).unwrap();
        let root = arena.wrap(&[head, tail], 1).unwrap();

        let model = CostModel::default();
        let ctx = Context::new(10);
        let optimal = Solver::new(&arena, &CharCount, &model)
            .evaluate(root, ctx)
            .unwrap();
        let greedy = Solver::new(&arena, &CharCount, &model)
            .with_wrap_strategy(WrapStrategy::Greedy)
            .evaluate(root, ctx)
            .unwrap();

        assert_eq!(lines(&arena, &optimal), vec!["aaaa", "bbbbbbbb"]);
        assert_eq!(lines(&arena, &greedy), vec!["aaaa", "bbbb", "bbbb"]);
        assert!(optimal.cost < greedy.cost);
    }

    #[test]
    fn greedy_fills_like_optimal_on_plain_text() {
        let mut arena = BlockArena::new();
        let items = texts(&mut arena, &["aaa"; 5]);
        let root = arena.wrap(&items, 1).unwrap();

        let model = CostModel::default();
        let greedy = Solver::new(&arena, &CharCount, &model)
            .with_wrap_strategy(WrapStrategy::Greedy)
            .evaluate(root, Context::new(11))
            .unwrap();
        assert_eq!(lines(&arena, &greedy), vec!["aaa aaa aaa", "aaa aaa"]);
    }
}

mod memo_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shared_tree(arena: &mut BlockArena) -> BlockId {
        let items = texts(arena, &["aaa", "bbb"]);
        let shared = arena.line(&items, 1).unwrap();
        let tail = arena.text("c").unwrap();
        let inline = arena.line(&[shared, tail], 1).unwrap();
        let stacked = arena.stack(&[shared, tail]).unwrap();
        arena.choice(&[inline, stacked]).unwrap()
    }

    #[test]
    fn shared_blocks_hit_the_memo() {
        let mut arena = BlockArena::new();
        let root = shared_tree(&mut arena);
        let model = CostModel::default();

        let mut solver = Solver::new(&arena, &CharCount, &model);
        solver.evaluate(root, Context::new(80)).unwrap();
        assert!(solver.stats().memo_hits > 0);
    }

    #[test]
    fn memo_does_not_change_results() {
        let mut arena = BlockArena::new();
        let root = shared_tree(&mut arena);
        let model = CostModel::default();

        for margin in [3, 7, 80] {
            let mut memoized = Solver::new(&arena, &CharCount, &model);
            let mut plain = Solver::new(&arena, &CharCount, &model).without_memo();
            let a = memoized.evaluate(root, Context::new(margin)).unwrap();
            let b = plain.evaluate(root, Context::new(margin)).unwrap();

            assert_eq!(a.cost, b.cost);
            assert_eq!(a.height, b.height);
            assert_eq!(lines(&arena, &a), lines(&arena, &b));
            assert_eq!(plain.stats().memo_hits, 0);
            assert!(plain.stats().evaluations > memoized.stats().evaluations);
        }
    }

    #[test]
    fn memo_is_cleared_between_calls() {
        let mut arena = BlockArena::new();
        let root = shared_tree(&mut arena);
        let model = CostModel::default();

        let mut solver = Solver::new(&arena, &CharCount, &model);
        solver.evaluate(root, Context::new(80)).unwrap();
        let first = solver.stats();
        solver.evaluate(root, Context::new(80)).unwrap();
        assert_eq!(solver.stats(), first);
    }

    #[test]
    fn text_is_measured_once_per_call() {
        let mut arena = BlockArena::new();
        let word = arena.text("word").unwrap();
        let line = arena.line(&[word, word, word], 1).unwrap();
        let stack = arena.stack(&[word, word]).unwrap();
        let root = arena.choice(&[line, stack]).unwrap();

        let calls = Cell::new(0);
        let width = |text: &str| -> Result<usize, WidthError> {
            calls.set(calls.get() + 1);
            Ok(text.chars().count())
        };
        let model = CostModel::default();
        let mut solver = Solver::new(&arena, &width, &model).without_memo();

        solver.evaluate(root, Context::new(80)).unwrap();
        assert_eq!(calls.get(), 1);
        solver.evaluate(root, Context::new(80)).unwrap();
        assert_eq!(calls.get(), 2);
    }
}

mod error_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn width_errors_propagate() {
        let mut arena = BlockArena::new();
        let good = arena.text("good").unwrap();
        let bad = arena.text("bad").unwrap();
        let root = arena.line(&[good, bad], 1).unwrap();

        let width = |text: &str| -> Result<usize, WidthError> {
            if text == "bad" {
                Err(WidthError::unmeasurable(text, "rejected"))
            } else {
                Ok(text.chars().count())
            }
        };
        let model = CostModel::default();
        let result = Solver::new(&arena, &width, &model).evaluate(root, Context::new(80));
        assert_eq!(
            result.unwrap_err(),
            LayoutError::Width(WidthError::unmeasurable("bad", "rejected"))
        );
    }

    #[test]
    fn unknown_root_is_rejected() {
        let mut other = BlockArena::new();
        other.text("a").unwrap();
        let foreign = other.text("b").unwrap();

        let arena = BlockArena::new();
        let model = CostModel::default();
        let result = Solver::new(&arena, &CharCount, &model).evaluate(foreign, Context::new(80));
        assert_eq!(result.unwrap_err(), LayoutError::UnknownRoot(foreign));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut arena = BlockArena::new();
        let root = arena.text("a").unwrap();
        let model = CostModel::default().with_overflow_weight(-1.0);
        let result = Solver::new(&arena, &CharCount, &model).evaluate(root, Context::new(80));
        assert!(matches!(result, Err(LayoutError::Config(_))));
    }
}

mod recursion_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deep_trees_do_not_overflow_the_stack() {
        let mut arena = BlockArena::new();
        let x = arena.text("x").unwrap();
        let mut root = x;
        for _ in 0..2_000 {
            root = arena.line(&[x, root], 0).unwrap();
        }

        let layout = solve(&arena, root, 80);
        let rendered = lines(&arena, &layout);
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].len(), 2_001);
    }
}

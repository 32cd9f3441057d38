// End-to-end tests: run programs through the tracer and inspect the report

use heapscope::config::TraceConfig;
use heapscope::runner::{run_source, RunReport};
use heapscope::snapshot::{GraphNode, Limits, Shape, ValueRef};
use heapscope::trace::{EventKind, TraceEvent};

fn run(source: &str) -> RunReport {
    run_source("prog.py", source, &TraceConfig::default())
}

fn run_with_limits(source: &str, limits: Limits) -> RunReport {
    let config = TraceConfig {
        limits,
        ..TraceConfig::default()
    };
    run_source("prog.py", source, &config)
}

/// Output of a program that is expected to succeed
fn stdout_of(source: &str) -> String {
    let report = run(source);
    assert!(report.success, "run failed: {:?}", report.error);
    report.stdout
}

fn last_event(report: &RunReport) -> &TraceEvent {
    report.events.last().expect("no events recorded")
}

fn node<'a>(event: &'a TraceEvent, id: &str) -> &'a GraphNode {
    event
        .memory
        .objects
        .iter()
        .find(|node| node.id == id)
        .unwrap_or_else(|| panic!("no node {}", id))
}

fn local<'a>(event: &'a TraceEvent, frame: usize, name: &str) -> &'a ValueRef {
    event.memory.frames[frame]
        .locals
        .get(name)
        .unwrap_or_else(|| panic!("no local {}", name))
}

// === TRACE SCENARIOS ===

#[test]
fn test_assignment_scenario() {
    let report = run("x = 1\ny = [x, x]\n");
    assert!(report.success);

    let kinds: Vec<EventKind> = report.events.iter().map(|e| e.event).collect();
    assert_eq!(
        kinds,
        [EventKind::Call, EventKind::Line, EventKind::Line, EventKind::Return]
    );

    let after = last_event(&report);
    assert_eq!(after.return_value.as_deref(), Some("None"));
    assert_eq!(after.memory.objects.len(), 2);

    let x = local(after, 0, "x").object_id().unwrap();
    let y = local(after, 0, "y").object_id().unwrap();
    assert_eq!(node(after, x).shape, Shape::Primitive);
    assert_eq!(node(after, x).scalar_value.as_deref(), Some("1"));

    let list = node(after, y);
    assert_eq!(list.display, "[1, 1]");
    let elements = list.elements.as_ref().unwrap();
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].object_id(), Some(x));
    assert_eq!(elements[1].object_id(), Some(x));
}

#[test]
fn test_return_event_carries_rendered_value() {
    let report = run("def pair(a):\n    return [a, a * 2]\n\nresult = pair(3)\n");
    let returned = report
        .events
        .iter()
        .find(|e| e.event == EventKind::Return && e.function == "pair")
        .unwrap();
    assert_eq!(returned.return_value.as_deref(), Some("[3, 6]"));
    assert_eq!(returned.line, 2);
}

#[test]
fn test_print_then_raise() {
    let report = run("print(\"hello\")\nraise ValueError(\"boom\")\n");
    assert!(!report.success);
    assert_eq!(report.stdout, "hello\n");
    assert!(!report.events.is_empty());

    let error = report.error.as_ref().unwrap();
    assert_eq!(error.message, "boom");
    assert_eq!(
        error.traceback,
        "Traceback (most recent call last):\n  File \"prog.py\", line 2, in <module>\n    raise ValueError(\"boom\")\nValueError: boom\n"
    );

    let raised = report
        .events
        .iter()
        .find(|e| e.event == EventKind::Exception)
        .unwrap();
    let exception = raised.exception.as_ref().unwrap();
    assert_eq!(exception.type_name, "ValueError");
    assert_eq!(exception.message, "ValueError('boom')");
    assert_eq!(raised.stdout, "hello\n");
}

#[test]
fn test_exception_reported_once_per_frame() {
    let source = "\
def inner():
    raise KeyError('k')

def outer():
    inner()

outer()
";
    let report = run(source);
    let functions: Vec<&str> = report
        .events
        .iter()
        .filter(|e| e.event == EventKind::Exception)
        .map(|e| e.function.as_str())
        .collect();
    assert_eq!(functions, ["inner", "outer", "<module>"]);

    let error = report.error.unwrap();
    assert_eq!(error.message, "'k'");
    assert!(error.traceback.contains("line 7, in <module>\n    outer()\n"));
    assert!(error.traceback.contains("line 5, in outer\n    inner()\n"));
    assert!(error.traceback.ends_with("in inner\n    raise KeyError('k')\nKeyError: 'k'\n"));
}

#[test]
fn test_unwinding_frame_returns_none() {
    let report = run("def f():\n    return 1 // 0\n\ntry:\n    f()\nexcept ZeroDivisionError:\n    pass\n");
    assert!(report.success);
    let returned = report
        .events
        .iter()
        .find(|e| e.event == EventKind::Return && e.function == "f")
        .unwrap();
    assert_eq!(returned.return_value.as_deref(), Some("None"));
}

#[test]
fn test_library_frames_are_elided() {
    let source = "\
def square(n):
    return n * n

squares = map(square, [1, 2])
print(squares)
";
    let report = run(source);
    assert!(report.success);
    assert_eq!(report.stdout, "[1, 4]\n");

    let inside: Vec<&TraceEvent> = report
        .events
        .iter()
        .filter(|e| e.function == "square")
        .collect();
    assert!(!inside.is_empty());
    for event in inside {
        let stack: Vec<&str> = event.stack.iter().map(|s| s.function.as_str()).collect();
        assert_eq!(stack, ["<module>", "square"]);
        let frames: Vec<&str> = event
            .memory
            .frames
            .iter()
            .map(|f| f.function.as_str())
            .collect();
        assert_eq!(frames, ["<module>", "square"]);
    }
    assert!(report.events.iter().all(|e| e.function != "map"));
}

#[test]
fn test_loop_header_reported_each_iteration() {
    let report = run("total = 0\nfor i in range(2):\n    total += i\n");
    let lines: Vec<usize> = report
        .events
        .iter()
        .filter(|e| e.event == EventKind::Line)
        .map(|e| e.line)
        .collect();
    assert_eq!(lines, [1, 2, 3, 2, 3, 2]);
}

#[test]
fn test_locals_exclude_self_and_dunders() {
    let source = "\
class Point:
    def __init__(self, x):
        self.x = x

p = Point(4)
";
    let report = run(source);
    let in_init = report
        .events
        .iter()
        .find(|e| e.function == "__init__" && e.event == EventKind::Return)
        .unwrap();
    let names: Vec<&str> = in_init.locals.keys().map(String::as_str).collect();
    assert_eq!(names, ["x"]);

    let end = last_event(&report);
    assert!(!end.locals.contains_key("__name__"));
    let point = end.locals.get("p").unwrap();
    assert!(point.starts_with("<__main__.Point object at 0x"), "{}", point);
}

#[test]
fn test_deterministic_runs() {
    let source = "\
class Node:
    def __init__(self, value):
        self.value = value
        self.next = None

head = Node(1)
head.next = Node(2)
seen = {3, 1, 2}
print(head.value, sorted(seen))
";
    let first = run(source).to_json(false).unwrap();
    let second = run(source).to_json(false).unwrap();
    assert_eq!(first, second);
}

// === SNAPSHOT PROPERTIES ===

#[test]
fn test_self_reference_is_one_node() {
    let report = run("a = []\na.append(a)\n");
    let end = last_event(&report);
    let id = local(end, 0, "a").object_id().unwrap();
    assert_eq!(end.memory.objects.len(), 1);
    let list = node(end, id);
    assert_eq!(list.display, "[[...]]");
    assert_eq!(list.elements.as_ref().unwrap()[0].object_id(), Some(id));
}

#[test]
fn test_aliasing_across_frames() {
    let source = "\
def grow(items):
    items.append(3)
    return len(items)

data = [1, 2]
grow(data)
";
    let report = run(source);
    let inside = report
        .events
        .iter()
        .find(|e| e.function == "grow" && e.event == EventKind::Line)
        .unwrap();
    assert_eq!(inside.memory.frames.len(), 2);
    let outer = local(inside, 0, "data").object_id();
    let inner = local(inside, 1, "items").object_id();
    assert!(outer.is_some());
    assert_eq!(outer, inner);
}

#[test]
fn test_item_bound() {
    let limits = Limits {
        max_items: 2,
        ..Limits::default()
    };
    let report = run_with_limits("xs = [1, 2, 3, 4, 5]\n", limits);
    let end = last_event(&report);
    let list = node(end, local(end, 0, "xs").object_id().unwrap());
    assert_eq!(list.elements.as_ref().unwrap().len(), 2);
    assert!(list.truncated);
}

#[test]
fn test_depth_bound() {
    let limits = Limits {
        max_depth: 1,
        ..Limits::default()
    };
    let report = run_with_limits("grid = [[1, 2], [3]]\n", limits);
    let end = last_event(&report);
    let outer = node(end, local(end, 0, "grid").object_id().unwrap());
    assert!(!outer.truncated);
    let first_row = outer.elements.as_ref().unwrap()[0].object_id().unwrap();
    let row = node(end, first_row);
    assert!(row.truncated);
    assert!(row.elements.is_none());
}

#[test]
fn test_object_bound_falls_back_inline() {
    let limits = Limits {
        max_objects: 1,
        ..Limits::default()
    };
    let report = run_with_limits("a = [1]\nb = {'k': 2}\n", limits);
    let end = last_event(&report);
    assert_eq!(end.memory.objects.len(), 1);
    assert_eq!(
        local(end, 0, "b"),
        &ValueRef::Primitive {
            value: "{'k': 2}".to_string()
        }
    );
}

#[test]
fn test_set_elements_sorted_by_text() {
    let report = run("s = {3, 1, 2}\ns.add(0)\ns.discard(0)\n");
    let end = last_event(&report);
    let set = node(end, local(end, 0, "s").object_id().unwrap());
    let texts: Vec<&str> = set
        .elements
        .as_ref()
        .unwrap()
        .iter()
        .map(ValueRef::text)
        .collect();
    assert_eq!(texts, ["1", "2", "3"]);
}

#[test]
fn test_instance_attributes_in_definition_order() {
    let source = "\
class Account:
    def __init__(self, owner):
        self.owner = owner
        self.balance = 0

acct = Account('ada')
";
    let report = run(source);
    let end = last_event(&report);
    let account = node(end, local(end, 0, "acct").object_id().unwrap());
    assert_eq!(account.shape, Shape::Object);
    assert_eq!(account.type_name, "Account");
    let names: Vec<&str> = account
        .attributes
        .as_ref()
        .unwrap()
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, ["owner", "balance"]);
}

// === HOST SEMANTICS ===

#[test]
fn test_closures_and_nonlocal() {
    let source = "\
def counter():
    count = 0
    def bump():
        nonlocal count
        count += 1
        return count
    return bump

tick = counter()
tick()
print(tick(), tick())
";
    assert_eq!(stdout_of(source), "2 3\n");
}

#[test]
fn test_classes_and_inheritance() {
    let source = "\
class Animal:
    sound = '...'
    def __init__(self, name):
        self.name = name
    def speak(self):
        return f'{self.name} says {self.sound}'

class Dog(Animal):
    sound = 'woof'
    def __str__(self):
        return 'Dog(' + self.name + ')'

d = Dog('rex')
print(d.speak())
print(d, isinstance(d, Animal), type(d).__name__)
";
    assert_eq!(stdout_of(source), "rex says woof\nDog(rex) True Dog\n");
}

#[test]
fn test_try_except_else_finally() {
    let source = "\
def check(n):
    try:
        if n < 0:
            raise ValueError('negative')
        result = 10 // n
    except ValueError as e:
        print('value', e)
    except ZeroDivisionError:
        print('zero')
    else:
        print('ok', result)
    finally:
        print('done')

check(-1)
check(0)
check(5)
";
    assert_eq!(
        stdout_of(source),
        "value negative\ndone\nzero\ndone\nok 2\ndone\n"
    );
}

#[test]
fn test_comprehensions() {
    let source = "\
evens = [x * x for x in range(6) if x % 2 == 0]
lengths = {word: len(word) for word in ['a', 'bcd']}
print(evens, lengths)
";
    assert_eq!(stdout_of(source), "[0, 4, 16] {'a': 1, 'bcd': 3}\n");
}

#[test]
fn test_recursion_limit_is_catchable() {
    let source = "\
def down(n):
    return down(n + 1)

try:
    down(0)
except RecursionError as e:
    print('caught', e)
";
    assert_eq!(stdout_of(source), "caught maximum recursion depth exceeded\n");
}

#[test]
fn test_builtins_and_methods() {
    let source = "\
words = 'the quick brown fox'.split()
print(sorted(words, key=len, reverse=True))
print('-'.join(words))
counts = {}
for w in words:
    counts[w[0]] = counts.get(w[0], 0) + 1
print(counts, max(counts, key=counts.get))
print(list(enumerate('ab')), list(zip([1, 2], 'xy')))
print(sum([1, 2, 3]), abs(-4), round(2.5), divmod(7, 2))
print(f'{3.14159:.2f}|{42:>5}|{7:03d}', '{} and {}'.format('a', 'b'))
";
    assert_eq!(
        stdout_of(source),
        "['quick', 'brown', 'the', 'fox']\n\
         the-quick-brown-fox\n\
         {'t': 1, 'q': 1, 'b': 1, 'f': 1} t\n\
         [(0, 'a'), (1, 'b')] [(1, 'x'), (2, 'y')]\n\
         6 4 2 (3, 1)\n\
         3.14|   42|007 a and b\n"
    );
}

#[test]
fn test_prelude_functions() {
    let source = "\
nums = [1, 2, 3, 4]
print(filter(lambda n: n % 2, nums), reduce(lambda a, b: a * b, nums))
print(any([0, 1]), all([1, 0]), all([]))
";
    assert_eq!(stdout_of(source), "[1, 3] 24\nTrue False True\n");
}

#[test]
fn test_name_error_message() {
    let report = run("print(missing)\n");
    assert!(!report.success);
    assert_eq!(
        report.error.unwrap().message,
        "name 'missing' is not defined"
    );
}

#[test]
fn test_integer_overflow_raises() {
    let report = run("n = 2 ** 62\nn = n * 4\n");
    assert!(!report.success);
    let error = report.error.unwrap();
    assert!(
        error
            .traceback
            .ends_with("OverflowError: integer result of '*' is too large\n"),
        "{}",
        error.traceback
    );
}

#[test]
fn test_sequence_repetition() {
    assert_eq!(
        stdout_of("print([1, 2] * 3, (1,) * 2, 2 * 'ab', [0] * -1)\n"),
        "[1, 2, 1, 2, 1, 2] (1, 1) abab []\n"
    );
}

#[test]
fn test_print_container_uses_element_repr() {
    let source = "\
class A:
    def __repr__(self):
        return 'A!'

print([A()], (A(), 1), {'k': A()})
print(str([A()]), f'{[A()]}')
";
    assert_eq!(stdout_of(source), "[A!] (A!, 1) {'k': A!}\n[A!] [A!]\n");
}

#[test]
fn test_float_floor_division_by_infinity() {
    let source = "\
x = float('inf') // 1
print(x, -1 // float('inf'), 7.5 // -2)
";
    assert_eq!(stdout_of(source), "nan -1.0 -4.0\n");
}

#[test]
fn test_huge_ranges_stay_exact() {
    let source = "\
r = range(-9223372036854775807 - 1, 9223372036854775807)
print(5 in r, r[-1], r[0], bool(r))
";
    assert_eq!(
        stdout_of(source),
        "True 9223372036854775806 -9223372036854775808 True\n"
    );
}

/// Run `print('start')` followed by `trigger`, and check that the failure is
/// a hosted exception that keeps everything recorded before it
fn assert_hosted_failure(trigger: &str, expected: &str) {
    let report = run(&format!("print('start')\n{}\n", trigger));
    assert!(!report.success, "{} succeeded", trigger);
    assert_eq!(report.stdout, "start\n");
    assert!(
        report.events.iter().any(|e| e.line == 2 && e.event == EventKind::Line),
        "no events kept for {}",
        trigger
    );
    let raised = report
        .events
        .iter()
        .find(|e| e.event == EventKind::Exception)
        .unwrap_or_else(|| panic!("no exception event for {}", trigger));
    assert_eq!(raised.line, 2);
    let traceback = report.error.unwrap().traceback;
    assert!(
        traceback.ends_with(&format!("{}\n", expected)),
        "{}: {}",
        trigger,
        traceback
    );
}

#[test]
fn test_range_length_overflow() {
    assert_hosted_failure(
        "n = len(range(-9223372036854775807 - 1, 9223372036854775807))",
        "OverflowError: Python int too large to convert to C ssize_t",
    );
    assert_hosted_failure(
        "xs = list(range(10 ** 15))",
        "OverflowError: too many items to collect",
    );
}

#[test]
fn test_enumerate_start_overflow() {
    assert_hosted_failure(
        "pairs = enumerate('ab', 9223372036854775807)",
        "OverflowError: integer result of '+' is too large",
    );
}

#[test]
fn test_round_limits() {
    assert_hosted_failure(
        "x = round(1e300)",
        "OverflowError: int too large to convert",
    );
    assert_hosted_failure(
        "x = round(float('nan'))",
        "ValueError: cannot convert float NaN to integer",
    );
    assert_eq!(
        stdout_of("print(round(15, -1), round(25, -1), round(-15, -1), round(7, -9223372036854775807 - 1))\n"),
        "20 20 -20 0\n"
    );
}

#[test]
fn test_percent_format_limits() {
    assert_hosted_failure("s = '%d' % 1e300", "OverflowError: int too large to convert");
    assert_hosted_failure("s = '%.99999999f' % 1.0", "ValueError: precision too big");
}

#[test]
fn test_format_width_limits() {
    assert_hosted_failure("s = format(12, '99999999999d')", "ValueError: width too big");
    assert_hosted_failure("s = f'{1:>9999999999}'", "ValueError: width too big");
    assert_hosted_failure("s = 'x'.ljust(10 ** 12)", "ValueError: width too big");
    assert_eq!(stdout_of("print(format(7, '>4'), 'ab'.center(6, '*'))\n"), "   7 **ab**\n");
}

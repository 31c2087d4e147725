//! Prompts for the planning and extraction oracles.

/// System message for the planning oracle.
pub const PLANNER_SYSTEM_PROMPT: &str =
    "You are a browser automation planner. Return ONLY a JSON array of commands. No explanation.";

/// Planning request template.
///
/// `{page}` receives the element inventory and `{goal}` the user goal.
pub const PLANNER_USER_TEMPLATE: &str = r##"You are a browser automation assistant. Analyze the page and determine the NEXT step(s) to reach the goal.

PAGE:
{page}

GOAL: {goal}

AVAILABLE ACTIONS:
- click: Click an element. Requires "index".
- fill: Type text into an input. Requires "index" and "value".
- press_enter: Press Enter key. Requires "index" (the input element).
- select: Choose dropdown option. Requires "index" and "value".
- scroll: Scroll the page. Optional "value": "up" or "down".
- wait: Wait for content to load. Optional "value": seconds.

RULES:
1. Look at the current page elements and decide what action(s) are needed NEXT.
2. For search: first "fill" the search box, then "press_enter" on same element.
3. Return 1-{max_actions} commands maximum per response.
4. If goal's data is ALREADY VISIBLE on page, return an EMPTY list: []
5. Return ONLY valid JSON - no explanation, no markdown.

EXAMPLE - Searching:
[{"action": "fill", "index": 5, "value": "hello"}, {"action": "press_enter", "index": 5}]

EXAMPLE - Data already visible:
[]

YOUR RESPONSE (JSON only):"##;

/// Extraction request template.
///
/// `{goal}` receives the user goal and `{content}` the truncated page text.
pub const EXTRACTION_USER_TEMPLATE: &str = r##"Extract the requested information from this page.

GOAL: {goal}

PAGE CONTENT:
{content}

Return the extracted data as JSON. Only include what's actually on the page."##;

/// Render the planning request.
pub fn planner_prompt(inventory: &str, goal: &str, max_actions: usize) -> String {
    PLANNER_USER_TEMPLATE
        .replace("{max_actions}", &max_actions.max(1).to_string())
        .replace("{goal}", goal)
        .replace("{page}", inventory)
}

/// Render the extraction request.
pub fn extraction_prompt(content: &str, goal: &str) -> String {
    EXTRACTION_USER_TEMPLATE
        .replace("{goal}", goal)
        .replace("{content}", content)
}

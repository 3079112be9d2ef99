use crate::calendar::Month;
use crate::date_key::DateKey;

pub fn render_index(today: &DateKey) -> String {
    INDEX_HTML.replace("{{MONTH}}", &Month::containing(*today).to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Booking Calendar</title>
  <style>
    :root {
      --bg: #f4f1ea;
      --ink: #2b2a28;
      --muted: #8b857d;
      --card: #ffffff;
      --applications: #f5c26b;
      --window: #8fd3b6;
      --both: #ff6b4a;
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px;
    }

    .app {
      width: min(560px, 100%);
      background: var(--card);
      border-radius: 24px;
      box-shadow: var(--shadow);
      padding: 28px;
      display: grid;
      gap: 20px;
    }

    h1 {
      margin: 0;
      font-size: 1.8rem;
    }

    .picker {
      display: flex;
      gap: 10px;
    }

    .picker input {
      flex: 1;
      padding: 12px 14px;
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      font-size: 1rem;
    }

    .picker input.errored {
      border-color: #c0392b;
      background: #f8d7da;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font-weight: 600;
      cursor: pointer;
      background: #2f4858;
      color: white;
    }

    .calendar[hidden] {
      display: none;
    }

    .calendar header {
      display: flex;
      justify-content: space-between;
      align-items: center;
      margin-bottom: 10px;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 6px;
    }

    .grid .weekday {
      font-size: 0.75rem;
      text-transform: uppercase;
      color: var(--muted);
      text-align: center;
    }

    .day {
      padding: 10px 0;
      text-align: center;
      border-radius: 10px;
      cursor: pointer;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .day.has-applications {
      background: var(--applications);
    }

    .day.has-window {
      background: var(--window);
    }

    .day.has-both {
      background: var(--both);
      color: white;
    }

    .legend {
      display: flex;
      flex-wrap: wrap;
      gap: 14px;
      font-size: 0.85rem;
      color: var(--muted);
    }

    .legend span::before {
      content: "";
      display: inline-block;
      width: 10px;
      height: 10px;
      border-radius: 3px;
      margin-right: 6px;
    }

    .legend .has-applications::before { background: var(--applications); }
    .legend .has-window::before { background: var(--window); }
    .legend .has-both::before { background: var(--both); }

    .status {
      min-height: 1.2em;
      font-size: 0.9rem;
      color: var(--muted);
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>Book a game</h1>
    <div class="picker">
      <input id="game-date" type="text" placeholder="Pick a date" readonly />
      <button id="open-calendar" type="button">Calendar</button>
    </div>
    <section class="calendar" id="calendar" hidden>
      <header>
        <button id="prev-month" type="button">&larr;</button>
        <strong id="month-label">{{MONTH}}</strong>
        <button id="next-month" type="button">&rarr;</button>
      </header>
      <div class="grid" id="grid"></div>
    </section>
    <div class="legend">
      <span class="has-applications">Requested</span>
      <span class="has-window">Open window</span>
      <span class="has-both">Requested and open</span>
    </div>
    <p class="status" id="status"></p>
  </main>

  <script>
    const input = document.getElementById('game-date');
    const calendarEl = document.getElementById('calendar');
    const gridEl = document.getElementById('grid');
    const monthLabel = document.getElementById('month-label');
    const statusEl = document.getElementById('status');
    const WEEKDAYS = ['Mon', 'Tue', 'Wed', 'Thu', 'Fri', 'Sat', 'Sun'];

    let sessionId = null;
    let month = '{{MONTH}}';

    const api = async (url, method = 'GET') => {
      const response = await fetch(url, { method });
      if (response.status === 204) return null;
      const body = await response.json();
      if (!response.ok) {
        throw new Error(body.error || `HTTP ${response.status}`);
      }
      return body;
    };

    const shiftMonth = (value, delta) => {
      const [year, mon] = value.split('-').map(Number);
      const date = new Date(Date.UTC(year, mon - 1 + delta, 1));
      return date.toISOString().slice(0, 7);
    };

    const paint = (view) => {
      monthLabel.textContent = view.month;
      gridEl.innerHTML = '';
      WEEKDAYS.forEach((name) => {
        const cell = document.createElement('div');
        cell.className = 'weekday';
        cell.textContent = name;
        gridEl.appendChild(cell);
      });
      for (let i = 0; i < view.leading_blanks; i += 1) {
        gridEl.appendChild(document.createElement('div'));
      }
      view.days.forEach((day) => {
        const cell = document.createElement('div');
        cell.className = day.css_class ? `day ${day.css_class}` : 'day';
        cell.textContent = Number(day.date.slice(8));
        cell.addEventListener('click', () => {
          input.value = day.date;
          calendarEl.hidden = true;
        });
        gridEl.appendChild(cell);
      });
    };

    const showMonth = async () => {
      const view = await api(`/api/sessions/${sessionId}/calendar?month=${month}`);
      paint(view);
    };

    const markFailed = (message) => {
      input.disabled = true;
      input.classList.add('errored');
      input.placeholder = 'Calendar unavailable, reopen to retry';
      calendarEl.hidden = true;
      statusEl.textContent = message;
    };

    const openCalendar = async () => {
      if (sessionId !== null) {
        api(`/api/sessions/${sessionId}`, 'DELETE').catch(() => {});
      }
      input.disabled = false;
      input.classList.remove('errored');
      input.placeholder = 'Pick a date';
      statusEl.textContent = 'Loading availability...';

      try {
        const session = await api('/api/sessions', 'POST');
        sessionId = session.id;
        await api(`/api/sessions/${sessionId}/init`, 'POST');
        await showMonth();
        calendarEl.hidden = false;
        statusEl.textContent = '';
      } catch (error) {
        markFailed(error.message);
      }
    };

    document.getElementById('open-calendar').addEventListener('click', openCalendar);
    document.getElementById('prev-month').addEventListener('click', () => {
      month = shiftMonth(month, -1);
      showMonth().catch((error) => markFailed(error.message));
    });
    document.getElementById('next-month').addEventListener('click', () => {
      month = shiftMonth(month, 1);
      showMonth().catch((error) => markFailed(error.message));
    });
  </script>
</body>
</html>
"#;

use super::html_shell;

/// Chat view markup.
///
/// The script keeps the same state as [`crate::client::ChatView`]: a message
/// list, a loading flag and the reply accumulated so far. Replies stream in as
/// plain text and are swapped for server-rendered markdown once `done` arrives.
const CONTENT: &str = r##"
    <section id="chat" class="chat-log">
        <div id="welcome" class="welcome">
            <h2>Welcome to PEO.AI</h2>
            <p>
                Enter your prompt below to get started with prompt engineering optimization.
                The optimizer will help you craft better prompts for more effective results.
            </p>
            <p class="tip">Tip: Be specific about your goals and provide context for better prompt optimization.</p>
        </div>
    </section>
    <p id="loading" class="loading" hidden>Generating response...</p>
    <form id="composer" class="composer">
        <textarea id="prompt" name="prompt" rows="2" placeholder="Enter your prompt here..."></textarea>
        <button id="send" type="submit" class="button">Send</button>
        <button id="new-chat" type="button" class="button outlined">New Chat</button>
    </form>
    <script>
    (() => {
        const FALLBACK_REPLY = "Sorry, there was an error processing your request. Please try again.";
        const state = { messages: [], isLoading: false, fullResponse: "", sessionId: null, source: null };

        const log = document.getElementById("chat");
        const welcome = document.getElementById("welcome");
        const loading = document.getElementById("loading");
        const form = document.getElementById("composer");
        const input = document.getElementById("prompt");
        const send = document.getElementById("send");

        async function openSession() {
            try {
                const res = await fetch("/api/sessions", { method: "POST" });
                if (res.ok) {
                    state.sessionId = (await res.json()).id;
                }
            } catch (e) {
                console.error("Could not create session, using default", e);
            }
        }

        function setLoading(value) {
            state.isLoading = value;
            loading.hidden = !value;
            send.disabled = value;
        }

        function appendMessage(role, content) {
            welcome.hidden = true;
            const el = document.createElement("div");
            el.className = "message " + role;
            if (role === "model") {
                const body = document.createElement("div");
                body.className = "streaming";
                body.textContent = content;
                el.appendChild(body);
            } else {
                el.textContent = content;
            }
            log.appendChild(el);
            state.messages.push({ role, content, el });
            el.scrollIntoView({ block: "end" });
        }

        function trailingModel() {
            const last = state.messages[state.messages.length - 1];
            return last && last.role === "model" ? last : null;
        }

        function setModelText(msg, text) {
            msg.content = text;
            msg.el.firstChild.textContent = text;
        }

        function fillEmptyReply() {
            const last = trailingModel();
            if (last && !last.content) {
                setModelText(last, FALLBACK_REPLY);
            }
        }

        async function renderFinal(msg) {
            if (!msg || !msg.content) {
                return;
            }
            try {
                const res = await fetch("/api/render", {
                    method: "POST",
                    headers: { "Content-Type": "application/json" },
                    body: JSON.stringify({ content: msg.content }),
                });
                if (res.ok) {
                    msg.el.innerHTML = (await res.json()).html;
                }
            } catch (e) {
                console.error("Render failed", e);
            }
        }

        function closeSource() {
            if (state.source) {
                state.source.close();
                state.source = null;
            }
        }

        function apply(data) {
            if (!state.isLoading) {
                return true;
            }
            let close = false;
            if (data.token) {
                state.fullResponse += data.token;
                const last = trailingModel();
                if (last) {
                    setModelText(last, state.fullResponse);
                }
            }
            if (data.done) {
                setLoading(false);
                close = true;
            }
            if (data.error) {
                console.error("Error from server:", data.error);
                setLoading(false);
                fillEmptyReply();
                close = true;
            }
            return close;
        }

        function submit(prompt) {
            if (!prompt.trim() || state.isLoading) {
                return;
            }
            const isFollowup = state.messages.length > 0;
            appendMessage("user", prompt);
            appendMessage("model", "");
            state.fullResponse = "";
            setLoading(true);

            const params = new URLSearchParams({ prompt, is_followup: String(isFollowup) });
            if (state.sessionId) {
                params.set("session_id", state.sessionId);
            }
            closeSource();
            const source = new EventSource("/generate?" + params.toString());
            state.source = source;

            source.onmessage = (event) => {
                let data;
                try {
                    data = JSON.parse(event.data);
                } catch (e) {
                    console.error("Error parsing message:", e);
                    return;
                }
                if (apply(data)) {
                    closeSource();
                    renderFinal(trailingModel());
                }
            };
            source.onerror = (e) => {
                console.error("EventSource error:", e);
                closeSource();
                setLoading(false);
                fillEmptyReply();
            };
            input.placeholder = "Enter your follow-up prompt here...";
        }

        form.addEventListener("submit", (event) => {
            event.preventDefault();
            const prompt = input.value;
            input.value = "";
            submit(prompt);
        });

        input.addEventListener("keydown", (event) => {
            if (event.key === "Enter" && !event.shiftKey) {
                event.preventDefault();
                form.requestSubmit();
            }
        });

        document.getElementById("new-chat").addEventListener("click", async () => {
            closeSource();
            setLoading(false);
            if (state.sessionId) {
                fetch("/api/sessions/" + encodeURIComponent(state.sessionId), { method: "DELETE" });
            }
            state.messages.forEach((m) => m.el.remove());
            state.messages = [];
            state.fullResponse = "";
            welcome.hidden = false;
            input.placeholder = "Enter your prompt here...";
            await openSession();
        });

        log.addEventListener("click", (event) => {
            const button = event.target.closest(".copy-button");
            if (!button) {
                return;
            }
            const code = button.parentElement.querySelector("code");
            if (code && navigator.clipboard) {
                navigator.clipboard.writeText(code.textContent);
            }
        });

        openSession();
    })();
    </script>
"##;

/// Chat page.
pub fn page() -> String {
    html_shell("Chat", CONTENT)
}

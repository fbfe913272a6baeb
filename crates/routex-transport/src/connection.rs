use std::cell::RefCell;
use std::rc::Rc;

use bytes::{Buf, BytesMut};
use routex_core::Dispatcher;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::TransportError;
use crate::handler::Handler;
use crate::http::{parse_head, HeadParse, Request, Response};

/// Largest request body accepted; bigger bodies get 413 and the connection closes.
pub const MAX_BODY: usize = 1 << 20;

/// The router shared by every connection on one worker thread.
pub type LocalRouter = Rc<RefCell<Dispatcher<Handler>>>;

/// Serves requests on one connection until the peer closes or asks to.
///
/// Framing errors are answered (400, 413, 414) and close the connection.
pub async fn serve_connection(
    mut stream: TcpStream,
    router: LocalRouter,
    max_head: usize,
) -> Result<(), TransportError> {
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        let head = loop {
            match parse_head(&buf, max_head) {
                HeadParse::Complete(head) => break head,
                HeadParse::Partial => {
                    if stream.read_buf(&mut buf).await? == 0 {
                        return Ok(());
                    }
                }
                HeadParse::TooLong => return reject(&mut stream, Response::uri_too_long()).await,
                HeadParse::Malformed => return reject(&mut stream, Response::bad_request()).await,
            }
        };

        buf.advance(head.consumed);
        if head.content_length > MAX_BODY {
            return reject(&mut stream, Response::payload_too_large()).await;
        }
        while buf.len() < head.content_length {
            if stream.read_buf(&mut buf).await? == 0 {
                return Ok(());
            }
        }

        let request = Request {
            method: head.method,
            target: head.target,
            headers: head.headers,
            body: buf.split_to(head.content_length).freeze(),
        };
        let response = respond(&router, &request);
        stream.write_all(&response.encode(head.keep_alive)).await?;

        if !head.keep_alive {
            return Ok(());
        }
    }
}

/// Dispatches and runs the handler. The router borrow ends before the handler runs.
pub fn respond(router: &RefCell<Dispatcher<Handler>>, request: &Request) -> Response {
    let outcome = router.borrow_mut().dispatch(request.method, &request.target);
    match outcome {
        Ok(matched) => matched.handler.call(request, &matched.params),
        Err(_) => Response::not_found(),
    }
}

async fn reject(stream: &mut TcpStream, response: Response) -> Result<(), TransportError> {
    tracing::debug!("Connection: rejecting request with {}", response.status());
    stream.write_all(&response.encode(false)).await?;
    Ok(())
}
